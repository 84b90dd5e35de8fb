//! HTTP handlers.
//!
//! Every analysis endpoint accepts the session id either as a path segment
//! (`/profile/{id}`) or as a query parameter (`/profile?session_id={id}`).
//! CPU-bound work runs on the blocking pool.

mod analysis;
mod explain;
mod health;
mod script;
mod upload;

pub use analysis::{cleaned, compare, delete_session, profile, risk};
pub use explain::explain;
pub use health::{health, root};
pub use script::script;
pub use upload::upload;

use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::state::AppState;
use axum::extract::{Path, Query};
use eda_processing::EdaResult;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

/// Pick the session id from the path if present, otherwise from the query.
fn session_id(path: Option<Path<String>>, query: &SessionQuery) -> ApiResult<String> {
    path.map(|Path(id)| id)
        .or_else(|| query.session_id.clone())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidInput("session_id is required".to_string()))
}

/// Resolve a live session. Malformed ids are reported like unknown ones.
fn lookup_session(state: &AppState, id: &str) -> ApiResult<Arc<Session>> {
    Uuid::parse_str(id.trim())
        .ok()
        .and_then(|uuid| state.sessions.get(&uuid))
        .ok_or_else(|| ApiError::session_not_found(id))
}

/// Run a session computation on the blocking pool.
async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> EdaResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}
