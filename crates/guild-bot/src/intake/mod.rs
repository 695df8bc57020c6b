//! HTTP intake for chat events.
//!
//! A gateway bridge posts every message-create and message-update event
//! here with the shared bearer token; each one is dispatched on its own
//! task.

mod middleware;

pub use middleware::{auth_middleware, rate_limit_middleware, IntakeAuth, RateLimitState};

use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use chat_client::InboundMessage;
use dispatcher::Dispatcher;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Events accepted per minute by [`create_router`].
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 600;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub auth: IntakeAuth,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, auth: IntakeAuth) -> Self {
        Self { dispatcher, auth }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Create,
    Update,
}

/// A message event posted by the gateway bridge.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageEvent {
    pub kind: EventKind,
    pub message: InboundMessage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
    pub message_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub scope_count: usize,
}

/// Create the intake router with the default rate limit.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(DEFAULT_REQUESTS_PER_MINUTE))
}

/// Create the intake router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    // Events require the bearer token and count against the rate limit.
    let events: Router<AppState> = Router::new()
        .route("/v1/events", post(receive_event))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(events)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        scope_count: state.dispatcher.scopes().scope_count().await,
    })
}

/// Accept an event and dispatch it in the background.
async fn receive_event(
    State(state): State<AppState>,
    Json(event): Json<MessageEvent>,
) -> (StatusCode, Json<AcceptedResponse>) {
    let message_id = event.message.id.clone();
    debug!(message = %message_id, kind = ?event.kind, "Event received");

    state
        .dispatcher
        .spawn(event.message, event.kind == EventKind::Update);

    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            accepted: true,
            message_id,
        }),
    )
}
