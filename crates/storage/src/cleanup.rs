//! Best-effort removal of temp upload artifacts.

use std::path::Path;
use tokio::fs;

/// Remove every path in `paths`, ignoring ones already gone.
///
/// Failures are logged and skipped so one stuck file never keeps the rest
/// around. Returns the number of files actually removed.
pub async fn cleanup<'a, I>(paths: I) -> usize
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut removed = 0;
    for path in paths {
        match fs::remove_file(path).await {
            Ok(()) => removed += 1,
            // Already moved into place or never written.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file");
            }
        }
    }

    if removed > 0 {
        tracing::debug!(removed, "Temp files removed");
    }
    removed
}
