use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use eda_processing::EdaError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload exceeds the {limit_mb} MB limit")]
    PayloadTooLarge { limit_mb: usize },

    #[error(transparent)]
    Processing(#[from] EdaError),

    #[error("Internal server error: {context}")]
    Internal { context: String },
}

impl ApiError {
    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound { id: id.into() }
    }

    pub fn internal(context: impl Into<String>) -> Self {
        Self::Internal {
            context: context.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Processing(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Processing(_) | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::SessionNotFound { .. } => "session_not_found",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::Processing(e) if e.is_client_error() => "invalid_dataset",
            ApiError::Processing(_) => "processing_error",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Machine-readable code; processing failures carry the engine's code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::SessionNotFound { .. } => "SESSION_NOT_FOUND",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ApiError::Processing(e) => e.error_code(),
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::internal(format!("background task failed: {err}"))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::InvalidInput(format!("malformed multipart body: {}", err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.error_type(),
                "code": self.code(),
                "message": self.to_string(),
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
