//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Malformed ip/port, rejected before any network call
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// IO error while writing or reading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Image could not be opened or decoded
    #[error("Image load failed: {0}")]
    ImageLoad(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
