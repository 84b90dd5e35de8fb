//! HTTP backend for the EDA assistant.
//!
//! A CSV upload opens a session; the analysis endpoints profile it, score
//! its data-quality risk, compare it with a cleaned copy, explain the risk
//! and generate a pandas cleaning script. All heavy lifting happens in
//! [`eda_processing`].
//!
//! # Routes
//!
//! ```text
//! GET    /                       banner
//! GET    /health                 liveness + live session count
//! POST   /upload                 multipart field "file" -> session
//! GET    /profile[/{id}]         dataset profile
//! GET    /risk[/{id}]            risk score, level and issues
//! GET    /explain[/{id}]         natural-language explanation
//! GET    /script[/{id}]          pandas cleaning script
//! GET    /compare[/{id}]         before/after cleaning metrics
//! GET    /cleaned[/{id}]         cleaned table as CSV
//! DELETE /session/{id}           drop a session
//! ```
//!
//! Without a path segment the session id is read from `?session_id=`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod session;
pub mod state;

pub use config::{ConfigError, ExplainProviderKind, ServerConfig, ServerConfigBuilder};
pub use error::{ApiError, ApiResult};
pub use session::{Artifact, Session, SessionStore};
pub use state::{AppState, build_explainer};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Multipart framing on top of the raw file bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/profile", get(handlers::profile))
        .route("/profile/:session_id", get(handlers::profile))
        .route("/risk", get(handlers::risk))
        .route("/risk/:session_id", get(handlers::risk))
        .route("/explain", get(handlers::explain))
        .route("/explain/:session_id", get(handlers::explain))
        .route("/script", get(handlers::script))
        .route("/script/:session_id", get(handlers::script))
        .route("/compare", get(handlers::compare))
        .route("/compare/:session_id", get(handlers::compare))
        .route("/cleaned", get(handlers::cleaned))
        .route("/cleaned/:session_id", get(handlers::cleaned))
        .route("/session/:session_id", delete(handlers::delete_session))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins. No origins means no cross-origin access.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}
