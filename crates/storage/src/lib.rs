//! Filesystem publishing for sigdrop.
//!
//! This crate provides:
//! - Staged, all-or-nothing publishing of a verified batch into a directory
//! - Atomic replacement of the per-identifier alias symlink
//! - Best-effort removal of temp upload artifacts

pub mod alias;
pub mod cleanup;
pub mod error;
pub mod publish;

pub use alias::publish_alias;
pub use cleanup::cleanup;
pub use error::{StorageError, StorageResult};
pub use publish::Publisher;
