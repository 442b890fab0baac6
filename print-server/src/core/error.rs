use thiserror::Error;

use crate::printing::DirectoryError;

/// Startup and serving failures
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Printer directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Failed to bind HTTP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
