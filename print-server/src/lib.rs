//! Comanda print server - restaurant receipt printing
//!
//! # Overview
//!
//! Takes an order from the POS, lays it out as a kitchen ticket or a cash
//! receipt, and delivers it to a network thermal printer. Printers that are
//! offline or out of paper get the receipt later from the delivery queue.
//!
//! # Module layout
//!
//! ```text
//! print-server/src/
//! ├── core/          # config, state, server
//! ├── printing/      # layout, money, assets, directory, delivery queue
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # errors, logging
//! ```

pub mod api;
pub mod core;
pub mod printing;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use printing::PrinterState;
pub use utils::{AppError, AppResult};

pub use utils::logger::init_logger_with_file;

/// Initialise logging from the configuration
pub fn setup_environment(config: &Config) {
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
}
