//! Printer directory
//!
//! Printers are configured in a JSON file: `[{"id": "cucina", "ip": "192.168.1.50", "port": 9100}]`.
//! Addresses are not validated on load; a bad entry fails when used.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use super::types::PrinterTarget;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to read printer directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid printer directory: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct PrinterDirectory {
    printers: HashMap<String, PrinterTarget>,
}

impl PrinterDirectory {
    pub fn new(printers: impl IntoIterator<Item = PrinterTarget>) -> Self {
        Self {
            printers: printers.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Load from a JSON file; a missing file is an empty directory
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        if !path.exists() {
            warn!(
                path = %path.display(),
                "Printer directory not found, every receipt goes to the console"
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let printers: Vec<PrinterTarget> = serde_json::from_str(&raw)?;
        info!(path = %path.display(), count = printers.len(), "Printer directory loaded");
        Ok(Self::new(printers))
    }

    pub fn get(&self, id: &str) -> Option<&PrinterTarget> {
        self.printers.get(id)
    }

    pub fn len(&self) -> usize {
        self.printers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.printers.is_empty()
    }
}
