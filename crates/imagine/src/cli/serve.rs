//! The `imagine serve` command.

use anyhow::Context;
use clap::Args;
use imagine_core::Imagine;
use std::net::SocketAddr;
use std::path::Path;

use crate::server::{self, AppState};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides `server.bind`)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let addr = match args.bind {
        Some(addr) => addr,
        None => config
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", config.server.bind))?,
    };

    let imagine = Imagine::new(config)?;
    let resolver = imagine.resolver();
    tracing::info!(
        "Filter sets: {} (adapter '{}')",
        resolver.filter_set_names().join(", "),
        resolver.adapter().name()
    );

    let app = server::router(AppState::new(imagine));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
