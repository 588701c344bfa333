//! Staged publishing of verified batches.

use crate::error::{StorageError, StorageResult};
use sigdrop_core::{DirectoryName, SignedBatch};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;
use uuid::Uuid;

/// Name prefix of per-publish staging directories inside the upload root.
const STAGING_PREFIX: &str = ".staging-";

/// Publishes batches under `<root>/<directory>/<file name>`.
///
/// A publish either lands every file of the batch or leaves the destination
/// as it was: files are first moved into a private staging directory, then
/// renamed into place one by one. Same-name files they displace are parked in
/// the staging directory so a failed commit can put them back.
pub struct Publisher {
    root: PathBuf,
}

/// A file moved into the staging directory, waiting to be committed.
struct Staged {
    name: String,
    staged: PathBuf,
    target: PathBuf,
}

/// A file renamed into the destination, with the file it displaced (if any).
struct Committed {
    target: PathBuf,
    previous: Option<PathBuf>,
}

impl Publisher {
    /// Create a publisher rooted at `root`, creating it if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Upload root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a batch for `directory` is published into.
    pub fn destination(&self, directory: &DirectoryName) -> PathBuf {
        self.root.join(directory)
    }

    /// Remove staging directories left behind by an interrupted publish.
    ///
    /// Returns the number of directories removed.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn sweep_stale_staging(&self) -> StorageResult<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_staging = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(STAGING_PREFIX));
            // file_type() does not follow symlinks
            if is_staging && entry.file_type().await?.is_dir() {
                fs::remove_dir_all(entry.path()).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Removed stale staging directories");
        }
        Ok(removed)
    }

    /// Publish every file of `batch` into the directory for `directory`.
    ///
    /// The destination is created if absent and reused if present; existing
    /// entries are kept unless a batch file has the same name. Returns the
    /// destination path.
    #[instrument(skip_all, fields(directory = %directory, files = batch.len()))]
    pub async fn publish(
        &self,
        batch: &SignedBatch,
        directory: &DirectoryName,
    ) -> StorageResult<PathBuf> {
        batch.validate_names()?;

        let destination = self.destination(directory);
        fs::create_dir_all(&destination).await?;

        let staging = self
            .root
            .join(format!("{STAGING_PREFIX}{}", Uuid::new_v4().simple()));
        fs::create_dir(&staging).await?;

        let result = self.publish_staged(batch, &staging, &destination).await;

        if let Err(e) = fs::remove_dir_all(&staging).await {
            tracing::warn!(
                staging = %staging.display(),
                error = %e,
                "Failed to remove staging directory"
            );
        }

        result?;
        tracing::info!(destination = %destination.display(), "Batch published");
        Ok(destination)
    }

    async fn publish_staged(
        &self,
        batch: &SignedBatch,
        staging: &Path,
        destination: &Path,
    ) -> StorageResult<()> {
        // Stage: nothing in the destination changes, so failures need no undo.
        let mut staged = Vec::with_capacity(batch.len());
        for (index, file) in batch.files().enumerate() {
            let name = file.target_name()?.to_string();
            // Index-based names keep same-name files in one batch apart.
            let staged_path = staging.join(index.to_string());

            move_file(&file.path, &staged_path)
                .await
                .map_err(|source| StorageError::Move {
                    file: name.clone(),
                    source,
                })?;
            if !fs::try_exists(&staged_path).await? {
                return Err(StorageError::MissingAfterMove(file.path.clone()));
            }

            staged.push(Staged {
                target: destination.join(&name),
                name,
                staged: staged_path,
            });
        }

        // Commit: rename into place, undoing everything on the first failure.
        let mut committed = Vec::with_capacity(staged.len());
        for (index, entry) in staged.iter().enumerate() {
            let parked = staging.join(format!("{index}.previous"));
            match commit_one(entry, &parked).await {
                Ok(done) => {
                    let landed = fs::try_exists(&done.target).await;
                    committed.push(done);
                    match landed {
                        Ok(true) => {}
                        Ok(false) => {
                            rollback(committed).await;
                            return Err(StorageError::MissingAfterMove(entry.target.clone()));
                        }
                        Err(e) => {
                            rollback(committed).await;
                            return Err(StorageError::Io(e));
                        }
                    }
                }
                Err(e) => {
                    rollback(committed).await;
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

/// Rename one staged file over its target, parking any file it displaces.
async fn commit_one(entry: &Staged, parked: &Path) -> StorageResult<Committed> {
    let move_error = |source| StorageError::Move {
        file: entry.name.clone(),
        source,
    };

    let previous = match fs::symlink_metadata(&entry.target).await {
        Ok(meta) if meta.is_dir() => {
            return Err(move_error(std::io::Error::new(
                std::io::ErrorKind::IsADirectory,
                format!("{} is a directory", entry.target.display()),
            )));
        }
        Ok(_) => {
            fs::rename(&entry.target, parked)
                .await
                .map_err(move_error)?;
            Some(parked.to_path_buf())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(StorageError::Io(e)),
    };

    if let Err(source) = fs::rename(&entry.staged, &entry.target).await {
        if let Some(previous) = &previous
            && let Err(e) = fs::rename(previous, &entry.target).await
        {
            tracing::error!(
                path = %entry.target.display(),
                error = %e,
                "Failed to restore displaced file"
            );
        }
        return Err(move_error(source));
    }

    Ok(Committed {
        target: entry.target.clone(),
        previous,
    })
}

/// Undo committed renames, newest first.
async fn rollback(committed: Vec<Committed>) {
    for done in committed.into_iter().rev() {
        match fs::remove_file(&done.target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(
                    path = %done.target.display(),
                    error = %e,
                    "Failed to remove partially published file"
                );
            }
        }
        if let Some(previous) = done.previous
            && let Err(e) = fs::rename(&previous, &done.target).await
        {
            tracing::error!(
                path = %done.target.display(),
                error = %e,
                "Failed to restore displaced file"
            );
        }
    }
}

/// Move a file, copying when source and destination are on different devices.
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            tracing::debug!(from = %from.display(), "Rename crosses devices, copying instead");
            fs::copy(from, to).await?;
            fs::remove_file(from).await
        }
        Err(e) => Err(e),
    }
}
