//! Signer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Signature verification errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("signer registry not found: {0}")]
    RegistryMissing(PathBuf),

    #[error("failed to spawn verifier {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("signature rejected for {file} (identity {identity})")]
    Rejected { file: String, identity: String },

    #[error("verification task failed: {0}")]
    Task(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for signer operations.
pub type SignerResult<T> = std::result::Result<T, SignerError>;
