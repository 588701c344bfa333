//! Batch verification with all-or-nothing semantics.

use crate::error::{SignerError, SignerResult};
use crate::verifier::SignatureVerifier;
use sigdrop_core::{Identifier, SIGNATURE_NAMESPACE, SignedBatch};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::instrument;

/// Drives one verification per signed file and folds the results.
///
/// Verifications run concurrently, bounded by a semaphore shared by every
/// batch going through this verifier.
#[derive(Clone)]
pub struct BatchVerifier {
    verifier: Arc<dyn SignatureVerifier>,
    limiter: Arc<Semaphore>,
}

impl BatchVerifier {
    /// Create a batch verifier allowing `max_concurrent` verifications at once.
    ///
    /// `max_concurrent` must be at least 1; a zero limit never grants a permit.
    pub fn new(verifier: Arc<dyn SignatureVerifier>, max_concurrent: usize) -> Self {
        Self {
            verifier,
            limiter: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Verify every pair in `batch` against `identity`.
    ///
    /// Returns the first failure observed, whether a rejection or a failed
    /// invocation. Verifications still running at that point are detached
    /// rather than aborted: they finish on their own and their results are
    /// dropped. Success is reported only once every pair was accepted.
    #[instrument(skip(self, batch), fields(verifier = self.verifier.verifier_name(), files = batch.len()))]
    pub async fn verify(&self, batch: &SignedBatch, identity: &Identifier) -> SignerResult<()> {
        let mut tasks = JoinSet::new();

        for pair in batch {
            let verifier = Arc::clone(&self.verifier);
            let limiter = Arc::clone(&self.limiter);
            let identity = identity.clone();
            let file_path = pair.file_path().to_path_buf();
            let file_name = pair.file.original_name.clone();
            let signature_path = pair.signature_path().to_path_buf();

            tasks.spawn(async move {
                let _permit = limiter
                    .acquire_owned()
                    .await
                    .map_err(|e| SignerError::Task(format!("verification limiter closed: {e}")))?;

                let mut message = tokio::fs::File::open(&file_path).await?;
                let accepted = verifier
                    .verify(SIGNATURE_NAMESPACE, &identity, &signature_path, &mut message)
                    .await?;

                if !accepted {
                    return Err(SignerError::Rejected {
                        file: file_name,
                        identity: identity.to_string(),
                    });
                }
                Ok::<(), SignerError>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| SignerError::Task(e.to_string()))
                .and_then(|result| result);

            if let Err(error) = outcome {
                let pending = tasks.len();
                // Dropping the set would abort the rest; let them run to completion instead.
                tasks.detach_all();
                tracing::warn!(
                    identity = %identity,
                    pending,
                    error = %error,
                    "Batch verification failed"
                );
                return Err(error);
            }
        }

        tracing::debug!(identity = %identity, "All signatures in batch accepted");
        Ok(())
    }
}
