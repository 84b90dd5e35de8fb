use super::run_blocking;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use eda_processing::{CsvLoader, DatasetMetadata};
use serde::Serialize;
use tracing::{info, warn};

const FILE_FIELD: &str = "file";

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub metadata: DatasetMetadata,
}

/// Accept a CSV as the multipart field `file` and open a session for it.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let limit_bytes = state.config.max_upload_bytes;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::InvalidInput("file field has no filename".to_string()))?;
        CsvLoader::validate_filename(&filename)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit_bytes))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload
        .ok_or_else(|| ApiError::InvalidInput(format!("missing multipart field '{FILE_FIELD}'")))?;
    if bytes.len() > limit_bytes {
        return Err(too_large(limit_bytes));
    }

    let size_bytes = bytes.len() as u64;
    let options = state.config.load.clone();
    let table = run_blocking(move || CsvLoader::load_bytes(&bytes, &options))
        .await
        .inspect_err(|e| warn!(error = %e, "Rejected upload '{}'", filename))?;

    let session = state.sessions.insert(filename.clone(), size_bytes, table);
    let metadata = CsvLoader::metadata(
        &filename,
        session.table(),
        &session.id.to_string(),
        size_bytes,
        &state.config.load,
    )?;

    info!(
        session_id = %session.id,
        rows = metadata.rows,
        columns = metadata.columns,
        size_bytes,
        "Uploaded '{}'",
        filename
    );

    Ok(Json(UploadResponse {
        success: true,
        metadata,
    }))
}

fn too_large(limit_bytes: usize) -> ApiError {
    ApiError::PayloadTooLarge {
        limit_mb: limit_bytes.div_ceil(1024 * 1024),
    }
}

/// The body limit surfaces as a multipart error; report it as 413.
fn multipart_error(err: MultipartError, limit_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(limit_bytes)
    } else {
        ApiError::from(err)
    }
}
