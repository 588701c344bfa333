//! Core domain types and shared logic for sigdrop.
//!
//! This crate defines the data model used across all other crates:
//! - Validated request identifiers (trust identity, destination directory)
//! - Uploaded temp files and their positional pairing with signatures
//! - Service configuration

pub mod batch;
pub mod config;
pub mod error;
pub mod ident;

pub use batch::{SignedBatch, SignedFile, UploadedFile};
pub use error::{Error, Result};
pub use ident::{DirectoryName, Identifier};

/// Maximum number of parts accepted per multipart field (`file[]`, `signature[]`).
pub const MAX_BATCH_FILES: usize = 10;

/// Namespace every upload signature must have been produced under.
pub const SIGNATURE_NAMESPACE: &str = "file";
