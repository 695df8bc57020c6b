//! Authentication and rate limiting for the event intake.

use crate::error::IntakeError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use secrecy::{ExposeSecret, SecretString};
use std::{num::NonZeroU32, sync::Arc};
use tracing::{debug, warn};

/// Global rate limiter (not keyed by caller).
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    pub global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    /// Allow `requests_per_minute` events across all callers.
    pub fn new(requests_per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));

        Self {
            global: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

/// Shared secret the gateway bridge presents as a bearer token.
#[derive(Clone)]
pub struct IntakeAuth {
    secret: Arc<SecretString>,
}

impl IntakeAuth {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret: Arc::new(secret),
        }
    }

    /// Whether an `Authorization` header value carries the secret.
    pub fn verify(&self, header: Option<&str>) -> bool {
        header
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| constant_time_eq(token, self.secret.expose_secret()))
    }
}

/// Reject requests without the intake bearer token with 401.
pub async fn auth_middleware(
    State(auth): State<IntakeAuth>,
    request: Request,
    next: Next,
) -> Result<Response, IntakeError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if !auth.verify(header) {
        warn!(uri = %request.uri(), "Rejected event without a valid bearer token");
        return Err(IntakeError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Reject requests over the global rate limit with 429.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, IntakeError> {
    if rate_limit.global.check().is_err() {
        warn!("Global rate limit exceeded");
        return Err(IntakeError::RateLimitExceeded);
    }

    debug!("Rate limit check passed");
    Ok(next.run(request).await)
}

/// Compare two strings without stopping at the first difference.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}
