//! Print API
//!
//! | path | method | description |
//! |------|--------|-------------|
//! | /api/print/kitchen | POST | kitchen ticket |
//! | /api/print/receipt | POST | cash receipt |
//! | /api/print/queue | GET | jobs waiting for delivery |
//! | /api/print/queue/sweep | POST | retry queued jobs now |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub use handler::{KitchenPrintRequest, QueueResponse, ReceiptPrintRequest, SweepResponse};

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/print", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/kitchen", post(handler::print_kitchen))
        .route("/receipt", post(handler::print_receipt))
        .route("/queue", get(handler::queue))
        .route("/queue/sweep", post(handler::sweep))
}
