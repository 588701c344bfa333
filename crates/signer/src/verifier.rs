//! Signature verification capability.

use crate::error::{SignerError, SignerResult};
use crate::registry::SignerRegistry;
use async_trait::async_trait;
use sigdrop_core::Identifier;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncRead;
use tokio::process::Command;
use tracing::instrument;

/// Verifies a detached signature over a byte stream.
///
/// `Ok(true)` means the signature was accepted for `identity` under
/// `namespace`, `Ok(false)` means it was rejected, and `Err` means the
/// verification could not be carried out at all.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Verify `signature` over the full contents of `message`.
    async fn verify(
        &self,
        namespace: &str,
        identity: &Identifier,
        signature: &Path,
        message: &mut (dyn AsyncRead + Send + Unpin),
    ) -> SignerResult<bool>;

    /// Get the verifier name for logging.
    fn verifier_name(&self) -> &'static str;
}

/// Verifier backed by `ssh-keygen -Y verify`.
pub struct SshKeygenVerifier {
    program: PathBuf,
    registry: SignerRegistry,
}

impl SshKeygenVerifier {
    /// Create a verifier running `program` against `registry`.
    pub fn new(program: impl Into<PathBuf>, registry: SignerRegistry) -> Self {
        Self {
            program: program.into(),
            registry,
        }
    }

    fn command(&self, namespace: &str, identity: &Identifier, signature: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-Y")
            .arg("verify")
            .arg("-f")
            .arg(self.registry.path())
            .arg("-n")
            .arg(namespace)
            .arg("-s")
            .arg(signature)
            .arg("-I")
            .arg(identity.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl SignatureVerifier for SshKeygenVerifier {
    #[instrument(skip(self, message, signature), fields(verifier = "ssh-keygen", signature = %signature.display()))]
    async fn verify(
        &self,
        namespace: &str,
        identity: &Identifier,
        signature: &Path,
        message: &mut (dyn AsyncRead + Send + Unpin),
    ) -> SignerResult<bool> {
        let mut child = self
            .command(namespace, identity, signature)
            .spawn()
            .map_err(|source| SignerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SignerError::Task("verifier stdin was not captured".to_string()))?;

        // Feed stdin while draining stdout/stderr so neither side blocks on a full pipe.
        let feed = async move {
            let copied = tokio::io::copy(message, &mut stdin).await;
            drop(stdin);
            copied
        };
        let (copied, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        match copied {
            Ok(bytes) => tracing::trace!(bytes, "Message streamed to verifier"),
            // The verifier may exit before reading everything; its exit status decides.
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::debug!("Verifier closed stdin early");
            }
            Err(e) => return Err(SignerError::Io(e)),
        }

        if output.status.success() {
            tracing::debug!(identity = %identity, "Signature accepted");
            Ok(true)
        } else {
            tracing::warn!(
                identity = %identity,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Signature rejected"
            );
            Ok(false)
        }
    }

    fn verifier_name(&self) -> &'static str {
        "ssh-keygen"
    }
}
