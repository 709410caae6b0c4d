//! Service initialization and main entry point

use crate::api::{self, AppState};
use crate::utils::config::AppSettings;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Run the HTTP service until Ctrl-C
pub async fn run(settings: AppSettings) -> Result<()> {
    let settings = settings.sanitized();
    let addr = SocketAddr::new(settings.host, settings.port);

    let state = AppState::from_settings(&settings).context("Failed to create HTTP clients")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "Server running");
    info!(
        endpoints = ?settings.endpoints.iter().map(|e| e.tag.as_str()).collect::<Vec<_>>(),
        "TikTok Downloader API ready"
    );
    info!("Health check: http://{addr}/health");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
