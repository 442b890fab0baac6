//! Printer adapters for sending ESC/POS data
//!
//! Network printers only (raw TCP, usually port 9100). Every call opens its
//! own connection and closes it before returning; nothing is pooled.

use crate::error::{PrintError, PrintResult};
use crate::escpos::PAPER_STATUS_QUERY;
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument};

/// Default time allowed for a status round trip
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Paper status reported by the printer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterStatus {
    Ok,
    /// Near-end sensor triggered, printing still possible
    PaperLow,
    /// Roll end detected, printing refused
    PaperOut,
}

impl PrinterStatus {
    /// Bits 5-6 of the DLE EOT 4 reply
    const PAPER_OUT_MASK: u8 = 0b0110_0000;
    /// Bits 2-3 of the DLE EOT 4 reply
    const PAPER_LOW_MASK: u8 = 0b0000_1100;

    /// Classify the first byte of a paper sensor reply
    pub fn from_status_byte(byte: u8) -> Self {
        if byte & Self::PAPER_OUT_MASK == Self::PAPER_OUT_MASK {
            PrinterStatus::PaperOut
        } else if byte & Self::PAPER_LOW_MASK == Self::PAPER_LOW_MASK {
            PrinterStatus::PaperLow
        } else {
            PrinterStatus::Ok
        }
    }

    /// Whether a job may be sent in this state
    pub fn can_print(self) -> bool {
        !matches!(self, PrinterStatus::PaperOut)
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterStatus::Ok => write!(f, "ok"),
            PrinterStatus::PaperLow => write!(f, "paper_low"),
            PrinterStatus::PaperOut => write!(f, "paper_out"),
        }
    }
}

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw ESC/POS data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Ask the printer for its paper status
    async fn status(&self) -> PrintResult<PrinterStatus>;
}

/// Network printer (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    status_timeout: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer
    ///
    /// The host must be non-empty after trimming and the port non-zero.
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(PrintError::InvalidAddress("empty printer ip".to_string()));
        }
        if port == 0 {
            return Err(PrintError::InvalidAddress(format!("{}: port 0", host)));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            status_timeout: STATUS_TIMEOUT,
        })
    }

    /// Set the status query timeout
    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }

    /// Get the printer address as `host:port`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn connect(&self) -> PrintResult<TcpStream> {
        TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr(), e)))
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(self, data), fields(addr = %self.addr(), data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        debug!("Connecting to printer");
        let mut stream = self.connect().await?;

        stream.write_all(data).await.map_err(|e| {
            PrintError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;
        stream.flush().await?;
        // Half-close so the printer sees end of job
        stream.shutdown().await?;

        info!("Print job sent successfully");
        Ok(())
    }

    #[instrument(skip(self), fields(addr = %self.addr()))]
    async fn status(&self) -> PrintResult<PrinterStatus> {
        let round_trip = async {
            let mut stream = self.connect().await?;
            stream.write_all(&PAPER_STATUS_QUERY).await?;

            let mut buf = [0u8; 16];
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                return Err(PrintError::Connection(format!(
                    "{}: closed before status reply",
                    self.addr()
                )));
            }
            Ok(buf[0])
        };

        // Dropping the future on timeout drops the stream with it
        let byte = tokio::time::timeout(self.status_timeout, round_trip)
            .await
            .map_err(|_| PrintError::Timeout(format!("Status query: {}", self.addr())))??;

        let status = PrinterStatus::from_status_byte(byte);
        debug!(byte, %status, "Printer status");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_status_byte_classification() {
        assert_eq!(PrinterStatus::from_status_byte(0b0110_0000), PrinterStatus::PaperOut);
        assert_eq!(PrinterStatus::from_status_byte(0b0000_1100), PrinterStatus::PaperLow);
        assert_eq!(PrinterStatus::from_status_byte(0), PrinterStatus::Ok);
        // Typical real replies carry the fixed bits 1 and 4
        assert_eq!(PrinterStatus::from_status_byte(0x12), PrinterStatus::Ok);
        assert_eq!(PrinterStatus::from_status_byte(0x7E), PrinterStatus::PaperOut);
        // A single bit of a pair is not enough
        assert_eq!(PrinterStatus::from_status_byte(0b0010_0100), PrinterStatus::Ok);
    }

    #[test]
    fn test_network_printer_new() {
        let printer = NetworkPrinter::new(" 192.168.1.100 ", 9100).unwrap();
        assert_eq!(printer.addr(), "192.168.1.100:9100");
    }

    #[test]
    fn test_invalid_addr() {
        assert!(matches!(
            NetworkPrinter::new("", 9100),
            Err(PrintError::InvalidAddress(_))
        ));
        assert!(matches!(
            NetworkPrinter::new("   ", 9100),
            Err(PrintError::InvalidAddress(_))
        ));
        assert!(matches!(
            NetworkPrinter::new("10.0.0.1", 0),
            Err(PrintError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_print_writes_whole_payload() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let printer = NetworkPrinter::new("127.0.0.1", port).unwrap();
        printer.print(&payload).await.unwrap();

        assert_eq!(server.await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_status_query_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut query = [0u8; 3];
            socket.read_exact(&mut query).await.unwrap();
            socket.write_all(&[0b0000_1100]).await.unwrap();
            query
        });

        let printer = NetworkPrinter::new("127.0.0.1", port).unwrap();
        assert_eq!(printer.status().await.unwrap(), PrinterStatus::PaperLow);
        assert_eq!(server.await.unwrap(), PAPER_STATUS_QUERY);
    }

    #[tokio::test]
    async fn test_status_query_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            // Hold the socket open without replying
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });

        let printer = NetworkPrinter::new("127.0.0.1", port)
            .unwrap()
            .with_status_timeout(Duration::from_millis(100));
        let result = printer.status().await;
        assert!(matches!(result, Err(PrintError::Timeout(_))));
        server.abort();
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let printer = NetworkPrinter::new("127.0.0.1", port).unwrap();
        let err = printer.print(b"x").await.unwrap_err();
        assert!(matches!(err, PrintError::Connection(_)));
    }
}
