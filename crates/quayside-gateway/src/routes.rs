//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use quayside_routing::ChatRouter;
use quayside_store::Store;

use crate::handlers::{health, sessions, ws};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /ws` - WebSocket channel (users and agents)
///
/// ## Sessions (read-only plus administrative close)
/// - `GET /v1/sessions` - List sessions, optional `?status=` filter
/// - `GET /v1/sessions/:session_id` - Get session
/// - `GET /v1/sessions/:session_id/messages` - Get transcript
/// - `DELETE /v1/sessions/:session_id` - Close session administratively
pub fn create_router<R, S>(state: GatewayState<R, S>) -> Router
where
    R: ChatRouter + 'static,
    S: Store + 'static,
{
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Channel
        .route("/ws", get(ws::websocket_handler::<R, S>))
        // Sessions
        .route("/v1/sessions", get(sessions::list_sessions::<R, S>))
        .route(
            "/v1/sessions/:session_id",
            get(sessions::get_session::<R, S>).delete(sessions::close_session::<R, S>),
        )
        .route(
            "/v1/sessions/:session_id/messages",
            get(sessions::list_messages::<R, S>),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
