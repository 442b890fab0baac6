//! Print API Handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::printing::{
    JobSummary, PricedReceiptLine, PrintOutcome, PrinterTarget, ReceiptContext, ReceiptLine,
    SweepReport,
};
use crate::utils::{AppError, AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct KitchenPrintRequest {
    /// Directory id; absent means console output
    #[serde(default)]
    pub printer_id: Option<String>,
    #[serde(default)]
    pub context: ReceiptContext,
    #[serde(default)]
    pub lines: Vec<ReceiptLine>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptPrintRequest {
    #[serde(default)]
    pub printer_id: Option<String>,
    #[serde(default)]
    pub context: ReceiptContext,
    #[serde(default)]
    pub lines: Vec<PricedReceiptLine>,
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub pending: usize,
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    /// false when a sweep was already running
    pub started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SweepReport>,
}

/// Look up `printer_id`; blank or missing means no printer
fn resolve_target<'a>(
    state: &'a ServerState,
    printer_id: Option<&str>,
) -> AppResult<Option<&'a PrinterTarget>> {
    match printer_id.map(str::trim).filter(|id| !id.is_empty()) {
        None => Ok(None),
        Some(id) => state
            .directory
            .get(id)
            .map(Some)
            .ok_or_else(|| AppError::NotFound(format!("Printer {} not found", id))),
    }
}

/// POST /api/print/kitchen
///
/// Renders the ticket with the printer's next progress number. Delivery
/// happens in the background.
pub async fn print_kitchen(
    State(state): State<ServerState>,
    payload: Result<Json<KitchenPrintRequest>, JsonRejection>,
) -> AppResult<Json<AppResponse<PrintOutcome>>> {
    let Json(req) = payload?;
    let target = resolve_target(&state, req.printer_id.as_deref())?;

    let outcome = state
        .printer_state
        .print_kitchen(target, &req.context, &req.lines)?;
    Ok(ok(outcome))
}

/// POST /api/print/receipt
pub async fn print_receipt(
    State(state): State<ServerState>,
    payload: Result<Json<ReceiptPrintRequest>, JsonRejection>,
) -> AppResult<Json<AppResponse<PrintOutcome>>> {
    let Json(req) = payload?;
    let target = resolve_target(&state, req.printer_id.as_deref())?;

    let outcome = state
        .printer_state
        .print_receipt(target, &req.context, &req.lines)
        .await?;
    Ok(ok(outcome))
}

/// GET /api/print/queue
pub async fn queue(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<QueueResponse>>> {
    let jobs = state.queue().pending();
    Ok(ok(QueueResponse {
        pending: jobs.len(),
        jobs,
    }))
}

/// POST /api/print/queue/sweep
///
/// Runs a sweep now instead of waiting for the next tick.
pub async fn sweep(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<SweepResponse>>> {
    let report = state.queue().sweep().await;
    if let Some(report) = report {
        tracing::info!(
            delivered = report.delivered,
            kept = report.kept,
            "Manual sweep finished"
        );
    }
    Ok(ok(SweepResponse {
        started: report.is_some(),
        report,
    }))
}
