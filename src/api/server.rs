use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{config::ApiServerConfig, errors::Error};

/// Bind and serve until Ctrl-C.
pub async fn start_api_server(config: &ApiServerConfig, router: Router) -> crate::Result<()> {
    let addr: SocketAddr = config
        .socket_address()
        .parse()
        .map_err(|e| Error::config(format!("Invalid API address: {}", e)))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::transport(format!("Failed to bind API server: {}", e)))?;

    info!(address = %addr, "Starting HTTP API server");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::transport(format!("API server error: {}", e)))?;

    info!("API server shutdown completed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "API server shutdown listener failed");
    }
}
