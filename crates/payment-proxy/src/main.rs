//! Payment proxy binary entry point.
//!
//! Usage: payment-proxy --webhook-url <url> [--test-mode] [--port <port>]
//!
//! Every flag can also come from the environment (`WEBHOOK_URL`,
//! `TEST_MODE`, `PORT`, ...); see `--help`.

use anyhow::Context;
use clap::Parser;
use payment_proxy::{AppState, Args};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    observability::init_with_config(args.log_config()).context("failed to initialize logging")?;

    let config = args.into_config().context("invalid configuration")?;
    config.log_summary();

    let state = AppState::from_config(&config).context("failed to build application state")?;

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    info!(addr = %listener.local_addr()?, "Payment proxy listening");

    payment_proxy::serve(listener, state, shutdown_signal()).await?;

    info!("Payment proxy stopped; in-flight deliveries abandoned");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
