//! Server Implementation
//!
//! Starts the delivery queue worker and the HTTP intake, and stops both on
//! Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::core::{Config, Result, ServerError, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<()> {
        let state = ServerState::initialize(&self.config)?;

        if self.config.parse_timezone().is_none() {
            tracing::warn!(
                timezone = %self.config.timezone,
                fallback = %crate::core::config::DEFAULT_TIMEZONE,
                "Unknown timezone, using fallback"
            );
        }

        let shutdown = CancellationToken::new();

        // Delivery queue worker
        let queue = Arc::clone(state.queue());
        let worker = tokio::spawn(queue.run(self.config.retry_interval(), shutdown.clone()));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                port: self.config.http_port,
                source,
            })?;

        tracing::info!(
            %addr,
            printers = state.directory.len(),
            assets = %self.config.asset_dir,
            "Print server listening"
        );

        let app = api::build_app(state);
        let signal = shutdown.clone();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down..."),
                    _ = signal.cancelled() => {}
                }
            })
            .await;

        shutdown.cancel();
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "Delivery queue worker panicked");
        }

        served.map_err(ServerError::Serve)
    }
}
