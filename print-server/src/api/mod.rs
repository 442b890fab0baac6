//! API routes
//!
//! - [`health`] - health check
//! - [`print`] - kitchen tickets, cash receipts, delivery queue

pub mod health;
pub mod print;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// All routes, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Print API
        .merge(print::router())
        // Health API
        .merge(health::router())
}

/// Routes with middleware and state, ready to serve
pub fn build_app(state: ServerState) -> Router {
    build_router()
        // CORS
        .layer(CorsLayer::permissive())
        // Trace - request logging at INFO level
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
