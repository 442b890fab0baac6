//! Receipt printing
//!
//! - Layout: kitchen tickets ([`KitchenTicketRenderer`]) and cash receipts
//!   ([`CashReceiptRenderer`]) as fixed-width text with ESC/POS markers
//! - Delivery: immediate attempt guarded by a status query, falling back to
//!   the [`DeliveryQueue`] retried on a fixed interval
//! - [`PrinterState`]: progress counters + queue, shared with the HTTP layer

pub mod assets;
pub mod directory;
pub mod money;
pub mod queue;
pub mod receipt;
pub mod renderer;
pub mod service;
pub mod transport;
pub mod types;
pub mod wrap;

pub use assets::{AssetStore, ReceiptAssets};
pub use directory::{DirectoryError, PrinterDirectory};
pub use money::{ReceiptTotals, format_currency, parse_amount};
pub use queue::{Delivery, DeliveryQueue, JobId, JobSummary, PrintJob, SweepReport};
pub use receipt::CashReceiptRenderer;
pub use renderer::KitchenTicketRenderer;
pub use service::{PrintOutcome, PrinterState};
pub use transport::{NetworkTransport, PrinterTransport};
pub use types::*;
pub use wrap::wrap;
