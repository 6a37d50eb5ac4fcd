//! # parkade-server
//!
//! HTTP server for the parkade parking lot system.
//!
//! This binary provides:
//! - REST API for spot management, parking sessions and billing
//! - OpenAPI document at `/api/openapi.json`
//! - Structured logging to file and stdout
//!
//! ## Running
//!
//! ```bash
//! # Development
//! cargo run --package parkade-server
//!
//! # With an explicit configuration file
//! PARKADE_CONFIG=./parkade.toml ./parkade-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::net::SocketAddr;

use anyhow::Context;
use parkade_core::LotConfig;
use parkade_server::{create_router, logging, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = LotConfig::load().context("Failed to load configuration")?;

    logging::init(config.server.production)?;

    info!(
        lot = %config.lot.name,
        strategy = %config.lot.strategy,
        production = config.server.production,
        "Starting parkade-server"
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let state = AppState::new(config).context("Failed to build parking lot")?;
    let app = create_router(state.shared());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
