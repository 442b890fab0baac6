//! Health check
//!
//! | path | method | description |
//! |------|--------|-------------|
//! | /health | GET | liveness, printer count, queued jobs |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::time::SystemTime;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    /// Printers in the directory
    printers: usize,
    /// Jobs waiting in the delivery queue
    pending_jobs: usize,
}

static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

fn get_uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(SystemTime::now);
    SystemTime::now()
        .duration_since(*start)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: get_uptime_seconds(),
        printers: state.directory.len(),
        pending_jobs: state.queue().len(),
    })
}
