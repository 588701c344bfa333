//! Server test utilities.

use crate::common::verifier::StubVerifier;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sigdrop_core::config::AppConfig;
use sigdrop_server::{AppState, create_router};
use sigdrop_storage::Publisher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub verifier: Arc<StubVerifier>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server, adjusting the default test config first.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let mut config = AppConfig::for_testing(temp_dir.path());
        adjust(&mut config);

        std::fs::create_dir_all(&config.storage.temp_dir).expect("Failed to create temp dir");
        std::fs::write(
            &config.signing.allowed_signers,
            "alice@example.com ssh-ed25519 AAAA\n",
        )
        .expect("Failed to write allowed signers");

        let publisher = Publisher::new(&config.storage.upload_path)
            .await
            .expect("Failed to create publisher");
        let verifier = Arc::new(StubVerifier::default());

        sigdrop_server::metrics::register_metrics();
        let state = AppState::new(config, verifier.clone(), publisher);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            verifier,
            _temp_dir: temp_dir,
        }
    }

    /// Send a request and return the status with the JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Root directory batches are published under.
    pub fn upload_root(&self) -> &Path {
        &self.state.config.storage.upload_path
    }

    /// Directory aliases are published in.
    pub fn alias_root(&self) -> &Path {
        self.state.alias_root().unwrap()
    }

    /// Path of the alias for `identifier`.
    pub fn alias(&self, identifier: &str) -> PathBuf {
        self.alias_root().join(identifier)
    }

    /// Names of everything left in the temp upload directory.
    pub fn temp_entries(&self) -> Vec<String> {
        std::fs::read_dir(self.state.temp_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    /// Number of signature verifications performed so far.
    pub fn verifications(&self) -> usize {
        self.verifier
            .calls
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}
