use std::time::Duration;

use axum::{http::StatusCode, middleware, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;

/// Create the full router with application state.
///
/// Requests running longer than `request_timeout` are answered with
/// `408 Request Timeout`; dropping the handler future cancels any in-flight
/// store call.
pub fn create_router_with_state(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}
