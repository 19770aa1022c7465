//! Health and queue-inspection HTTP routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use gather_engine::DeliveryQueue;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    queue: DeliveryQueue,
    inspect_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(queue: DeliveryQueue, inspect_token: Option<String>) -> Self {
        Self {
            queue,
            inspect_token: inspect_token.map(Arc::from),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/queue", get(inspect_queue))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn inspect_queue(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorized(state.inspect_token.as_deref(), &headers) {
        tracing::warn!("Rejected queue inspection request");
        return StatusCode::FORBIDDEN.into_response();
    }
    Json(state.queue.snapshot().await).into_response()
}

/// Exact match against `Bearer <token>`. With no token configured the
/// route is closed.
fn authorized(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}
