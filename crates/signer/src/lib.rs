//! Detached signature verification for sigdrop.
//!
//! This crate provides:
//! - The signer registry (trust anchor) loaded once at startup
//! - The `SignatureVerifier` capability and its `ssh-keygen` implementation
//! - Batch verification with bounded concurrency and all-or-nothing results

pub mod batch;
pub mod error;
pub mod registry;
pub mod verifier;

pub use batch::BatchVerifier;
pub use error::{SignerError, SignerResult};
pub use registry::SignerRegistry;
pub use verifier::{SignatureVerifier, SshKeygenVerifier};
