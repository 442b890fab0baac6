//! Printer transport seam
//!
//! The delivery queue talks to printers through [`PrinterTransport`] so the
//! retry logic can run against a scripted transport in tests.

use async_trait::async_trait;
use comanda_printer::{NetworkPrinter, PrintResult, Printer, PrinterStatus};

#[async_trait]
pub trait PrinterTransport: Send + Sync {
    /// Write a full payload to `ip:port`
    async fn send(&self, ip: &str, port: u16, payload: &[u8]) -> PrintResult<()>;

    /// Query paper status of `ip:port`
    async fn query_status(&self, ip: &str, port: u16) -> PrintResult<PrinterStatus>;
}

/// Raw TCP (port 9100 style) printers
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkTransport;

#[async_trait]
impl PrinterTransport for NetworkTransport {
    async fn send(&self, ip: &str, port: u16, payload: &[u8]) -> PrintResult<()> {
        NetworkPrinter::new(ip, port)?.print(payload).await
    }

    async fn query_status(&self, ip: &str, port: u16) -> PrintResult<PrinterStatus> {
        NetworkPrinter::new(ip, port)?.status().await
    }
}
