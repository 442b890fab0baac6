//! Print service
//!
//! [`PrinterState`] owns everything mutable about printing (per-printer
//! progress counters and the delivery queue) and is shared through the HTTP
//! state. Callers get an answer as soon as the receipt is rendered; the
//! network side runs in a spawned task.

use std::sync::Arc;

use comanda_printer::{PrintSegment, strip_commands};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{error, info, instrument};

use super::assets::{AssetStore, ReceiptAssets};
use super::queue::{Delivery, DeliveryQueue};
use super::receipt::CashReceiptRenderer;
use super::renderer::KitchenTicketRenderer;
use super::types::{PricedReceiptLine, PrinterTarget, ReceiptContext, ReceiptLine};
use crate::utils::{AppError, AppResult};

/// Progress key for receipts without a printer
pub const CONSOLE_SINK: &str = "console";

/// What happened to a print request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrintOutcome {
    /// Handed to the printer (or its retry queue)
    Accepted {
        printer_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        progress: Option<u64>,
    },
    /// No printer: plain text for display
    Console {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        progress: Option<u64>,
    },
}

pub struct PrinterState {
    progress: DashMap<String, u64>,
    queue: Arc<DeliveryQueue>,
    kitchen: KitchenTicketRenderer,
    cash: CashReceiptRenderer,
    assets: AssetStore,
}

impl PrinterState {
    pub fn new(
        queue: Arc<DeliveryQueue>,
        kitchen: KitchenTicketRenderer,
        cash: CashReceiptRenderer,
        assets: AssetStore,
    ) -> Self {
        Self {
            progress: DashMap::new(),
            queue,
            kitchen,
            cash,
            assets,
        }
    }

    pub fn queue(&self) -> &Arc<DeliveryQueue> {
        &self.queue
    }

    /// Bump and return the progress number of `printer_id` (first is 1)
    pub fn next_progress(&self, printer_id: &str) -> u64 {
        let mut entry = self.progress.entry(printer_id.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Current progress number (0 before the first kitchen ticket)
    pub fn progress(&self, printer_id: &str) -> u64 {
        self.progress.get(printer_id).map(|v| *v).unwrap_or(0)
    }

    /// Render a kitchen ticket and send it to `target`, or to the console
    #[instrument(
        skip_all,
        fields(printer_id = target.map(|t| t.id.as_str()).unwrap_or(CONSOLE_SINK))
    )]
    pub fn print_kitchen(
        &self,
        target: Option<&PrinterTarget>,
        ctx: &ReceiptContext,
        lines: &[ReceiptLine],
    ) -> AppResult<PrintOutcome> {
        let Some(target) = target else {
            let progress = self.next_progress(CONSOLE_SINK);
            let text = strip_commands(&self.kitchen.render(ctx, lines, progress));
            info!(progress, "Kitchen ticket (no printer):\n{}", text);
            return Ok(PrintOutcome::Console {
                text,
                progress: Some(progress),
            });
        };

        target.validate()?;
        let progress = self.next_progress(&target.id);
        let text = self.kitchen.render(ctx, lines, progress);
        self.submit(target, vec![PrintSegment::Text(text)]);

        info!(progress, items = lines.len(), "Kitchen ticket accepted");
        Ok(PrintOutcome::Accepted {
            printer_id: target.id.clone(),
            progress: Some(progress),
        })
    }

    /// Render a cash receipt (with logo and footer) and send it
    #[instrument(
        skip_all,
        fields(printer_id = target.map(|t| t.id.as_str()).unwrap_or(CONSOLE_SINK))
    )]
    pub async fn print_receipt(
        &self,
        target: Option<&PrinterTarget>,
        ctx: &ReceiptContext,
        lines: &[PricedReceiptLine],
    ) -> AppResult<PrintOutcome> {
        let Some(target) = target else {
            let segments = self.cash.render(ctx, lines, &ReceiptAssets::default());
            let text = console_text(&segments);
            info!("Cash receipt (no printer):\n{}", text);
            return Ok(PrintOutcome::Console {
                text,
                progress: None,
            });
        };

        target.validate()?;

        let store = self.assets.clone();
        let ticket_number = ctx.ticket_number.clone();
        let assets = tokio::task::spawn_blocking(move || store.load(&ticket_number))
            .await
            .map_err(|e| AppError::Internal(format!("asset task failed: {}", e)))?;

        let segments = self.cash.render(ctx, lines, &assets);
        self.submit(target, segments);

        info!(items = lines.len(), "Cash receipt accepted");
        Ok(PrintOutcome::Accepted {
            printer_id: target.id.clone(),
            progress: None,
        })
    }

    /// Deliver in the background; failures land in the queue
    fn submit(&self, target: &PrinterTarget, payload: Vec<PrintSegment>) {
        let queue = Arc::clone(&self.queue);
        let target = target.clone();
        tokio::spawn(async move {
            match queue.safe_print(&target, payload).await {
                Ok(Delivery::Printed) => {}
                Ok(Delivery::Queued(job_id)) => {
                    info!(printer_id = %target.id, job_id, "Receipt waiting in delivery queue");
                }
                Err(e) => {
                    error!(printer_id = %target.id, error = %e, "Receipt dropped");
                }
            }
        });
    }
}

/// Text segments with commands removed, tickets separated by a cut line
fn console_text(segments: &[PrintSegment]) -> String {
    segments
        .iter()
        .filter_map(|s| match s {
            PrintSegment::Text(t) => Some(strip_commands(t)),
            PrintSegment::RawBytes(_) => None,
        })
        .collect::<Vec<_>>()
        .join("- - - - - - - - - - - - - - - - - - - - - - - -\n")
}
