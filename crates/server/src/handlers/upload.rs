//! Signed batch upload endpoint.

use crate::error::{ApiError, ApiResult};
use crate::handlers::health::StatusResponse;
use crate::metrics::{
    BYTES_PUBLISHED, FILES_PUBLISHED, InFlightGuard, UPLOADS_ACCEPTED, VERIFICATION_DURATION,
    record_upload_rejected,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use sigdrop_core::{
    DirectoryName, Error as CoreError, Identifier, MAX_BATCH_FILES, SignedBatch, UploadedFile,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const FILE_FIELD: &str = "file[]";
const SIGNATURE_FIELD: &str = "signature[]";
const IDENTIFIER_FIELD: &str = "identifier";
const DIRECTORY_FIELD: &str = "directory";

/// POST /api/upload
///
/// Accepts up to ten `file[]` parts with positionally paired `signature[]`
/// parts, verifies every signature for `identifier`, publishes the files
/// under `directory` and points the identifier's alias at it. Every temp
/// part written for the request is removed before the response goes out.
pub async fn upload_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let _in_flight = InFlightGuard::new();
    let mut temp = TempUploads::default();

    let result = process_upload(&state, multipart, &mut temp).await;
    temp.cleanup().await;

    match result {
        Ok(()) => {
            UPLOADS_ACCEPTED.inc();
            Ok(Json(StatusResponse::ok()))
        }
        Err(e) => {
            record_upload_rejected(e.code());
            Err(e)
        }
    }
}

async fn process_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    temp: &mut TempUploads,
) -> ApiResult<()> {
    let form = receive_form(state.temp_dir(), multipart?, temp).await?;

    if form.files.is_empty() || form.signatures.is_empty() {
        return Err(ApiError::MissingParts);
    }
    let identifier = Identifier::parse(form.identifier.as_deref().unwrap_or_default())?;
    if state.config.storage.is_reserved_alias(&identifier) {
        return Err(CoreError::InvalidIdentifier(format!(
            "{identifier} names a storage directory"
        ))
        .into());
    }
    let directory = DirectoryName::parse(form.directory.as_deref().unwrap_or_default())?;
    let batch = SignedBatch::pair(form.files, form.signatures)?;
    batch.validate_names()?;

    tracing::info!(
        identifier = %identifier,
        directory = %directory,
        files = batch.len(),
        bytes = batch.total_size(),
        "Upload received"
    );

    let timer = VERIFICATION_DURATION.start_timer();
    let verified = state.verifier.verify(&batch, &identifier).await;
    timer.observe_duration();
    verified?;

    let destination = state.publisher.publish(&batch, &directory).await?;
    FILES_PUBLISHED.inc_by(batch.len() as u64);
    BYTES_PUBLISHED.inc_by(batch.total_size());

    let alias_root = state
        .alias_root()
        .ok_or_else(|| ApiError::Internal("upload path has no parent directory".to_string()))?;
    let alias = sigdrop_storage::publish_alias(alias_root, &identifier, &destination).await?;

    tracing::info!(
        identifier = %identifier,
        destination = %destination.display(),
        alias = %alias.display(),
        "Upload published"
    );
    Ok(())
}

/// Multipart fields collected from one request.
#[derive(Default)]
struct UploadForm {
    files: Vec<UploadedFile>,
    signatures: Vec<UploadedFile>,
    identifier: Option<String>,
    directory: Option<String>,
}

async fn receive_form(
    temp_dir: &Path,
    mut multipart: Multipart,
    temp: &mut TempUploads,
) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD | SIGNATURE_FIELD => {
                let (field_name, parts) = if name == FILE_FIELD {
                    (FILE_FIELD, &mut form.files)
                } else {
                    (SIGNATURE_FIELD, &mut form.signatures)
                };
                if parts.len() >= MAX_BATCH_FILES {
                    return Err(ApiError::TooManyFiles { field: field_name });
                }

                let original_name = field.file_name().unwrap_or_default().to_string();
                let path = temp_dir.join(Uuid::new_v4().simple().to_string());
                // Tracked before the first byte lands so a failed write is still cleaned.
                temp.track(path.clone());
                let size = spool(field, &path).await?;
                parts.push(UploadedFile::new(path, original_name, size));
            }
            IDENTIFIER_FIELD => form.identifier = Some(field.text().await?),
            DIRECTORY_FIELD => form.directory = Some(field.text().await?),
            other => tracing::debug!(field = other, "Ignoring unexpected multipart field"),
        }
    }

    Ok(form)
}

/// Stream one multipart part to `path`, returning its size.
async fn spool(mut field: Field<'_>, path: &Path) -> ApiResult<u64> {
    let io_error =
        |e: std::io::Error| ApiError::Internal(format!("failed to write {}: {e}", path.display()));

    let mut file = fs::File::create(path).await.map_err(io_error)?;
    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await.map_err(io_error)?;
        size += chunk.len() as u64;
    }
    file.flush().await.map_err(io_error)?;

    Ok(size)
}

/// Temp paths written for one request.
///
/// [`TempUploads::cleanup`] removes them once the request is settled. If the
/// request future is dropped first (client went away), `Drop` removes them
/// synchronously instead.
#[derive(Default)]
struct TempUploads {
    paths: Vec<PathBuf>,
    cleaned: bool,
}

impl TempUploads {
    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    async fn cleanup(mut self) {
        sigdrop_storage::cleanup(self.paths.iter().map(PathBuf::as_path)).await;
        self.cleaned = true;
    }
}

impl Drop for TempUploads {
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        for path in &self.paths {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file");
                }
            }
        }
    }
}
