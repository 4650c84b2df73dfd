//! Shroud Connect - local interception proxy
//!
//! Point a client's HTTPS proxy at this process and trust its CA; calls to the
//! configured provider hosts are redirected through the gateway.

use anyhow::Result;
use tokio::signal;
use tracing::{info, warn};

use shroud::interception::{self, ConnectConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shroud=info".into()),
        )
        .with_target(true)
        .init();

    let config = ConnectConfig::from_env()?;
    info!(gateway = %config.gateway_url, port = config.port, "Starting Shroud Connect");

    interception::run(config, shutdown_signal()).await
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, stopping proxy"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
