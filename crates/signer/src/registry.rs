//! Signer registry (allowed signers file).

use crate::error::{SignerError, SignerResult};
use std::path::{Path, PathBuf};

/// Trust anchor listing the identities allowed to sign uploads.
///
/// The file format belongs to the verification program; this type only
/// guarantees the file exists and hands its path on.
#[derive(Clone, Debug)]
pub struct SignerRegistry {
    path: PathBuf,
}

impl SignerRegistry {
    /// Load the registry, failing if the path is missing or not a regular file.
    pub async fn load(path: impl AsRef<Path>) -> SignerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SignerError::RegistryMissing(path));
            }
            Err(e) => return Err(SignerError::Io(e)),
        };
        if !metadata.is_file() {
            return Err(SignerError::RegistryMissing(path));
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let entries = count_entries(&contents);
        if entries == 0 {
            tracing::warn!(path = %path.display(), "Signer registry has no entries, every upload will be rejected");
        } else {
            tracing::info!(path = %path.display(), entries, "Signer registry loaded");
        }

        Ok(Self { path })
    }

    /// Path passed to the verification program.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Count non-blank, non-comment lines.
fn count_entries(contents: &str) -> usize {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .count()
}
