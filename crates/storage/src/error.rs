//! Storage error types.

use std::path::PathBuf;
use thiserror::Error;

/// Publishing errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to move {file}: {source}")]
    Move {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file missing after move: {0}")]
    MissingAfterMove(PathBuf),

    #[error("failed to publish alias {path}: {source}")]
    Alias {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file name: {0}")]
    InvalidFileName(#[from] sigdrop_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
