//! In-memory signature verifier.

use async_trait::async_trait;
use sigdrop_core::{Identifier, SIGNATURE_NAMESPACE};
use sigdrop_signer::{SignatureVerifier, SignerError, SignerResult};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Accepts when the signature file holds `<identity>:<message>`.
///
/// A signature holding [`INVOCATION_FAILURE`] makes the call fail as if the
/// verification program could not be run.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
#[derive(Default)]
pub struct StubVerifier {
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
pub const INVOCATION_FAILURE: &[u8] = b"<spawn failure>";

/// Signature bytes the stub accepts for `contents` signed by `identity`.
#[allow(dead_code)]
pub fn stub_signature(identity: &str, contents: &[u8]) -> Vec<u8> {
    let mut signature = format!("{identity}:").into_bytes();
    signature.extend_from_slice(contents);
    signature
}

#[async_trait]
impl SignatureVerifier for StubVerifier {
    async fn verify(
        &self,
        namespace: &str,
        identity: &Identifier,
        signature: &Path,
        message: &mut (dyn AsyncRead + Send + Unpin),
    ) -> SignerResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let expected = tokio::fs::read(signature).await?;
        if expected == INVOCATION_FAILURE {
            return Err(SignerError::Task("stub verifier unavailable".to_string()));
        }

        let mut body = Vec::new();
        message.read_to_end(&mut body).await?;

        Ok(namespace == SIGNATURE_NAMESPACE
            && stub_signature(identity.as_str(), &body) == expected)
    }

    fn verifier_name(&self) -> &'static str {
        "stub"
    }
}
