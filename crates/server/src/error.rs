//! API error types.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sigdrop_core::Error as CoreError;
use sigdrop_signer::SignerError;
use sigdrop_storage::StorageError;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// API error type.
///
/// The `Display` output carries internal detail for logs; clients only ever
/// see [`ApiError::public_message`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("both files and signatures are required")]
    MissingParts,

    #[error("too many parts in field {field}")]
    TooManyFiles { field: &'static str },

    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("not a multipart request: {0}")]
    NotMultipart(#[from] MultipartRejection),

    #[error("invalid request: {0}")]
    Request(#[from] CoreError),

    #[error("verification failed: {0}")]
    Verification(#[from] SignerError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error code for this error, used as a metric label.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParts => "missing_parts",
            Self::TooManyFiles { .. } => "too_many_files",
            Self::Multipart(_) | Self::NotMultipart(_) => "multipart",
            Self::Request(e) => match e {
                CoreError::InvalidIdentifier(_) => "invalid_identifier",
                CoreError::InvalidDirectory(_) => "invalid_directory",
                CoreError::InvalidFileName(_) => "invalid_file_name",
                CoreError::EmptyBatch => "missing_parts",
                CoreError::CountMismatch { .. } => "count_mismatch",
            },
            Self::Verification(_) => "verification_failed",
            Self::Storage(StorageError::Alias { .. }) => "alias_failed",
            Self::Storage(StorageError::InvalidFileName(_)) => "invalid_file_name",
            Self::Storage(_) => "publish_failed",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParts | Self::TooManyFiles { .. } | Self::Request(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Multipart(e) => e.status(),
            Self::NotMultipart(e) => e.status(),
            Self::Storage(StorageError::InvalidFileName(_)) => StatusCode::BAD_REQUEST,
            Self::Verification(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the client.
    pub fn public_message(&self) -> String {
        let message = match self {
            Self::MissingParts => "Both files and signatures are required",
            Self::TooManyFiles { .. } => "Too many files",
            Self::Multipart(e) => return e.body_text(),
            Self::NotMultipart(e) => return e.body_text(),
            Self::Request(e) => match e {
                CoreError::InvalidIdentifier(_) => "Invalid identifier",
                CoreError::InvalidDirectory(_) => "Invalid directory",
                CoreError::InvalidFileName(_) => "Invalid file name",
                CoreError::EmptyBatch => "Both files and signatures are required",
                CoreError::CountMismatch { .. } => {
                    "Mismatch between number of files and signatures"
                }
            },
            // Rejections and failed invocations look the same from outside.
            Self::Verification(_) => "Error verifying file signature",
            Self::Storage(StorageError::Alias { .. }) => "Failed to publish alias",
            Self::Storage(StorageError::InvalidFileName(_)) => "Invalid file name",
            Self::Storage(_) => "Failed to move files",
            Self::Internal(_) => "Internal server error",
        };
        message.to_string()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Upload failed");
        } else {
            tracing::info!(code = self.code(), error = %self, "Upload rejected");
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
