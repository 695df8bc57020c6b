//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Chat error: {0}")]
    Chat(#[from] chat_client::ChatError),

    #[error("State error: {0}")]
    Store(#[from] scope_store::StoreError),

    #[error("Query backend error: {0}")]
    Query(#[from] query_backends::QueryError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

/// Errors returned to callers of the event intake.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Missing or invalid bearer token")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            IntakeError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            IntakeError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
