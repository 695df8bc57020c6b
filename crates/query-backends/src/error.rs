//! Query backend errors.

use thiserror::Error;

/// Errors a query backend can report. All of them are recoverable: the
/// caller moves on to the next backend.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Authentication failed")]
    Unauthorized,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("No result for query")]
    NoResult,

    #[error("Empty response from query backend")]
    EmptyResponse,
}

impl QueryError {
    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            QueryError::Http(_) | QueryError::RateLimit => true,
            QueryError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
