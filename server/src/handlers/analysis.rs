use super::{SessionQuery, lookup_session, run_blocking, session_id};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use eda_processing::{ComparisonResult, CsvLoader, DatasetProfile, RiskAssessment};
use serde::Serialize;
use std::path::Path as FsPath;
use tracing::info;
use uuid::Uuid;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub profile: DatasetProfile,
}

#[derive(Serialize)]
pub struct RiskResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub risk: RiskAssessment,
    pub generated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CompareResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub comparison: ComparisonResult,
    pub generated_at: DateTime<Utc>,
}

pub async fn profile(
    State(state): State<AppState>,
    path: Option<Path<String>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<ProfileResponse>> {
    let session = lookup_session(&state, &session_id(path, &query)?)?;
    let worker = session.clone();
    let profile = run_blocking(move || worker.profile()).await?;

    Ok(Json(ProfileResponse {
        session_id: session.id.to_string(),
        profile: (*profile).clone(),
    }))
}

pub async fn risk(
    State(state): State<AppState>,
    path: Option<Path<String>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<RiskResponse>> {
    let session = lookup_session(&state, &session_id(path, &query)?)?;
    let worker = session.clone();
    let risk = run_blocking(move || worker.risk()).await?;

    Ok(Json(RiskResponse {
        session_id: session.id.to_string(),
        risk: risk.value.clone(),
        generated_at: risk.generated_at,
    }))
}

pub async fn compare(
    State(state): State<AppState>,
    path: Option<Path<String>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<CompareResponse>> {
    let session = lookup_session(&state, &session_id(path, &query)?)?;
    let worker = session.clone();
    let comparison = run_blocking(move || worker.comparison()).await?;

    Ok(Json(CompareResponse {
        session_id: session.id.to_string(),
        comparison: comparison.value.clone(),
        generated_at: comparison.generated_at,
    }))
}

/// The cleaned table as a CSV download.
pub async fn cleaned(
    State(state): State<AppState>,
    path: Option<Path<String>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Response> {
    let session = lookup_session(&state, &session_id(path, &query)?)?;
    let worker = session.clone();
    let bytes = run_blocking(move || {
        let cleaned = worker.cleaned()?;
        CsvLoader::to_csv_bytes(&cleaned)
    })
    .await?;

    let stem = FsPath::new(&session.filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    let disposition = format!("attachment; filename=\"{stem}_cleaned.csv\"");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let uuid = Uuid::parse_str(id.trim()).map_err(|_| ApiError::session_not_found(&id))?;
    if state.sessions.remove(&uuid) {
        info!("Deleted session {}", uuid);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::session_not_found(id))
    }
}
