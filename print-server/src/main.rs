use print_server::{Config, Server, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env, then configuration
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // 2. Logging
    setup_environment(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Comanda print server starting...");

    // 3. Serve until Ctrl-C
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
