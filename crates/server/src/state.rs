//! Application state shared across handlers.

use sigdrop_core::config::AppConfig;
use sigdrop_signer::{BatchVerifier, SignatureVerifier};
use sigdrop_storage::Publisher;
use std::path::Path;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Batch signature verifier, shared limiter included.
    pub verifier: BatchVerifier,
    /// Publisher rooted at the upload path.
    pub publisher: Arc<Publisher>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        config: AppConfig,
        verifier: Arc<dyn SignatureVerifier>,
        publisher: Publisher,
    ) -> Self {
        let verifier = BatchVerifier::new(verifier, config.signing.max_concurrent_verifications);
        Self {
            config: Arc::new(config),
            verifier,
            publisher: Arc::new(publisher),
        }
    }

    /// Scratch directory multipart parts are spooled to.
    pub fn temp_dir(&self) -> &Path {
        &self.config.storage.temp_dir
    }

    /// Directory aliases are published in.
    pub fn alias_root(&self) -> Option<&Path> {
        self.config.storage.alias_root()
    }
}
