//! tokloader - TikTok video resolver and media relay
//!
//! Resolves shareable TikTok links through a chain of third-party lookup
//! services and relays the selected media file back to the caller.

use anyhow::Result;
use clap::Parser;
use std::net::IpAddr;
use tokloader::app;
use tokloader::utils::AppSettings;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tokloader", version, about)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = AppSettings {
        host: args.host,
        port: args.port,
        ..Default::default()
    };

    app::run(settings).await
}
