//! Query backend contract.

use crate::error::QueryError;
use async_trait::async_trait;
use chat_client::Embed;
use serde::{Deserialize, Serialize};

/// A successful backend answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    /// Reply payload.
    pub answer: Embed,
    /// Opaque token for multi-turn follow-ups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<String>,
}

impl QueryAnswer {
    pub fn new(answer: Embed) -> Self {
        Self {
            answer,
            continuation: None,
        }
    }

    pub fn with_continuation(mut self, token: impl Into<String>) -> Self {
        self.continuation = Some(token.into());
        self
    }
}

/// Request body sent to HTTP backends.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<&'a str>,
}

/// Trait for implementing query backends.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Backend name, used in logs.
    fn name(&self) -> &str;

    /// Whether the backend takes and returns continuation tokens.
    fn supports_continuation(&self) -> bool {
        false
    }

    /// Answer a free-text query.
    async fn query(
        &self,
        text: &str,
        continuation: Option<&str>,
    ) -> Result<QueryAnswer, QueryError>;
}
