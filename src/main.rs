//! Line chat server - Entry Point
//!
//! Reads the configuration, binds the listener, starts the ChatServer actor
//! and accepts connections.
//!
//! Usage: `linechat [ADDR | PORT]` (default `0.0.0.0:9001`)

use tracing::info;
use tracing_subscriber::EnvFilter;

use linechat::{acceptor, ChatServer, ServerConfig};

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=linechat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("linechat=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    // Bind before anything else runs; failure exits non-zero
    let listener = acceptor::bind(&config.bind_addr).await?;

    let server = ChatServer::spawn(CHANNEL_BUFFER_SIZE);
    info!("ChatServer actor started");

    acceptor::run(listener, server, config.connection).await;
    Ok(())
}
