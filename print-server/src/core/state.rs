//! Server state shared by every handler

use std::path::Path;
use std::sync::Arc;

use crate::core::{Config, Result};
use crate::printing::{
    AssetStore, CashReceiptRenderer, DeliveryQueue, KitchenTicketRenderer, NetworkTransport,
    PrinterDirectory, PrinterState, PrinterTransport,
};

/// Cheap to clone: everything behind `Arc`
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub directory: Arc<PrinterDirectory>,
    pub printer_state: Arc<PrinterState>,
}

impl ServerState {
    /// Load the printer directory and wire up the network transport
    pub fn initialize(config: &Config) -> Result<Self> {
        let directory = PrinterDirectory::load(Path::new(&config.printers_file))?;
        Ok(Self::with_transport(
            config,
            directory,
            Arc::new(NetworkTransport),
        ))
    }

    /// Build state around a given directory and transport
    pub fn with_transport(
        config: &Config,
        directory: PrinterDirectory,
        transport: Arc<dyn PrinterTransport>,
    ) -> Self {
        let tz = config.tz();
        let printer_state = PrinterState::new(
            Arc::new(DeliveryQueue::new(transport)),
            KitchenTicketRenderer::new(config.receipt_width, tz),
            CashReceiptRenderer::new(config.receipt_width, tz),
            AssetStore::new(
                &config.asset_dir,
                &config.default_asset_dir,
                config.paper_width_dots,
            ),
        );

        Self {
            config: config.clone(),
            directory: Arc::new(directory),
            printer_state: Arc::new(printer_state),
        }
    }

    pub fn queue(&self) -> &Arc<DeliveryQueue> {
        self.printer_state.queue()
    }
}
