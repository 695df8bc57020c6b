//! JSON-over-HTTP query backend.

use crate::error::QueryError;
use crate::types::{QueryAnswer, QueryBackend, QueryRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Default retry configuration
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;
const DEFAULT_MAX_BACKOFF_MS: u64 = 2000;

/// Query backend reached over HTTP.
///
/// Posts `{"query": ..., "continuation": ...}` to the configured URL and
/// expects `{"answer": <embed>, "continuation": ...}` back. A 404 means the
/// backend has no answer.
pub struct HttpQueryBackend {
    client: Client,
    name: String,
    url: String,
    api_key: Option<SecretString>,
    continuation: bool,
    max_retries: u32,
}

impl HttpQueryBackend {
    /// Create a new HTTP backend.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, QueryError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            name: name.into(),
            url: url.into(),
            api_key: None,
            continuation: false,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Send a bearer token with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }

    /// Exchange continuation tokens with the backend.
    pub fn with_continuation(mut self, enabled: bool) -> Self {
        self.continuation = enabled;
        self
    }

    /// Set how many times transient failures are retried.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn query_once(
        &self,
        text: &str,
        continuation: Option<&str>,
    ) -> Result<QueryAnswer, QueryError> {
        let request = QueryRequest {
            query: text,
            continuation: if self.continuation { continuation } else { None },
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key.expose_secret()));
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(self.extract_error(response).await);
        }

        let body = response.text().await?;
        debug!(
            "Response body: {}",
            body.chars().take(200).collect::<String>()
        );
        let answer: QueryAnswer = serde_json::from_str(&body)?;

        if answer.answer.is_empty() {
            return Err(QueryError::EmptyResponse);
        }

        Ok(answer)
    }

    /// Extract error information from failed response.
    async fn extract_error(&self, response: reqwest::Response) -> QueryError {
        let status = response.status();

        match status {
            StatusCode::NOT_FOUND => QueryError::NoResult,
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(backend = %self.name, "Rate limit exceeded");
                QueryError::RateLimit
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(backend = %self.name, "Authentication failed");
                QueryError::Unauthorized
            }
            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".into());
                QueryError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

#[async_trait]
impl QueryBackend for HttpQueryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_continuation(&self) -> bool {
        self.continuation
    }

    /// Query with automatic retry and exponential backoff on transient
    /// errors.
    #[instrument(skip(self, text, continuation), fields(backend = %self.name))]
    async fn query(
        &self,
        text: &str,
        continuation: Option<&str>,
    ) -> Result<QueryAnswer, QueryError> {
        let mut backoff_ms = DEFAULT_INITIAL_BACKOFF_MS;
        let mut attempt = 0;

        loop {
            match self.query_once(text, continuation).await {
                Ok(answer) => return Ok(answer),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("Query failed (attempt {}): {}", attempt, e);
                    debug!("Retry attempt {} after {}ms backoff", attempt, backoff_ms);
                    sleep(Duration::from_millis(backoff_ms)).await;
                    // Exponential backoff with cap
                    backoff_ms = (backoff_ms * 2).min(DEFAULT_MAX_BACKOFF_MS);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
