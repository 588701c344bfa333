//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid directory: {0}")]
    InvalidDirectory(String),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("batch must contain at least one file and one signature")]
    EmptyBatch,

    #[error("count mismatch: {files} files, {signatures} signatures")]
    CountMismatch { files: usize, signatures: usize },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
