//! Connection acceptor
//!
//! Binds the listening socket and spawns one handler task per accepted
//! connection. Handler failures are logged here and go no further.

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::ConnectionOptions;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::server::ServerHandle;

/// Bind the listening socket
///
/// Failure is fatal for the server: nothing has been started yet.
pub async fn bind(addr: &str) -> Result<TcpListener, AppError> {
    let listener = TcpListener::bind(addr).await.map_err(|source| AppError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    match listener.local_addr() {
        Ok(local) => info!("Chat server listening on {}", local),
        Err(_) => info!("Chat server listening on {}", addr),
    }
    Ok(listener)
}

/// Accept connections forever
///
/// Each connection gets its own task; accepting never waits on a handler.
/// A failed accept is logged and the loop carries on.
pub async fn run(listener: TcpListener, server: ServerHandle, options: ConnectionOptions) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let server = server.clone();
                let options = options.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, addr.to_string(), server, options).await {
                        warn!("Connection handler error for {}: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_port_in_use() {
        let first = bind("127.0.0.1:0").await.unwrap();
        let addr = first.local_addr().unwrap().to_string();

        let result = bind(&addr).await;
        assert!(matches!(result, Err(AppError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_bind_invalid_address() {
        let result = bind("not an address").await;
        match result {
            Err(AppError::Bind { addr, .. }) => assert_eq!(addr, "not an address"),
            other => panic!("expected bind error, got {:?}", other.map(|_| ())),
        }
    }
}
