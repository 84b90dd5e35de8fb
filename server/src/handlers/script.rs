use super::{SessionQuery, lookup_session, run_blocking, session_id};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use eda_processing::CleaningScript;
use serde::Serialize;

#[derive(Serialize)]
pub struct ScriptResponse {
    pub session_id: String,
    /// The script text; the same value as `code`.
    pub script: String,
    #[serde(flatten)]
    pub cleaning: CleaningScript,
}

/// A pandas script reproducing the default cleaning transform.
pub async fn script(
    State(state): State<AppState>,
    path: Option<Path<String>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<ScriptResponse>> {
    let session = lookup_session(&state, &session_id(path, &query)?)?;
    let worker = session.clone();
    let script = run_blocking(move || worker.script()).await?;

    Ok(Json(ScriptResponse {
        session_id: session.id.to_string(),
        script: script.code.clone(),
        cleaning: (*script).clone(),
    }))
}
