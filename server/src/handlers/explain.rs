use super::{SessionQuery, lookup_session, run_blocking, session_id};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use eda_processing::Explanation;
use serde::Serialize;

#[derive(Serialize)]
pub struct ExplainResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub explanation: Explanation,
    pub generated_at: DateTime<Utc>,
}

/// Natural-language summary of the risk assessment.
///
/// Uses the configured remote provider and falls back to rule-based text
/// when none is configured or the call fails.
pub async fn explain(
    State(state): State<AppState>,
    path: Option<Path<String>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<ExplainResponse>> {
    let session = lookup_session(&state, &session_id(path, &query)?)?;
    let worker = session.clone();
    let provider = state.explainer.clone();
    let explanation = run_blocking(move || worker.explanation(provider.as_deref())).await?;

    Ok(Json(ExplainResponse {
        session_id: session.id.to_string(),
        explanation: explanation.value.clone(),
        generated_at: explanation.generated_at,
    }))
}
