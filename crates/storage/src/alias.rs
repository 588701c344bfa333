//! Per-identifier alias symlinks.

use crate::error::{StorageError, StorageResult};
use sigdrop_core::Identifier;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;
use uuid::Uuid;

/// Point `<alias_root>/<identifier>` at `destination`.
///
/// Whatever previously occupied the alias path is replaced. The new link is
/// created under a temporary name and renamed over the alias, so readers see
/// either the old target or the new one, never a missing alias. A real
/// directory at the alias path is never removed; the alias fails instead.
#[instrument(skip_all, fields(identifier = %identifier, destination = %destination.display()))]
pub async fn publish_alias(
    alias_root: &Path,
    identifier: &Identifier,
    destination: &Path,
) -> StorageResult<PathBuf> {
    let alias = alias_root.join(identifier.as_str());
    let alias_error = |source| StorageError::Alias {
        path: alias.clone(),
        source,
    };

    let temp = alias_root.join(format!(
        ".{}.alias-{}",
        identifier,
        Uuid::new_v4().simple()
    ));
    create_symlink(destination, &temp)
        .await
        .map_err(alias_error)?;

    match fs::symlink_metadata(&alias).await {
        Ok(meta) if meta.is_dir() => {
            tracing::warn!(alias = %alias.display(), "Directory occupies alias path");
            discard(&temp).await;
            return Err(alias_error(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "a directory occupies the alias path",
            )));
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            discard(&temp).await;
            return Err(alias_error(source));
        }
    }

    if let Err(source) = fs::rename(&temp, &alias).await {
        discard(&temp).await;
        return Err(alias_error(source));
    }

    tracing::info!(alias = %alias.display(), "Alias published");
    Ok(alias)
}

async fn discard(temp: &Path) {
    if let Err(e) = fs::remove_file(temp).await {
        tracing::warn!(path = %temp.display(), error = %e, "Failed to remove temporary alias");
    }
}

#[cfg(unix)]
async fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    fs::symlink(target, link).await
}

#[cfg(windows)]
async fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    fs::symlink_dir(target, link).await
}
