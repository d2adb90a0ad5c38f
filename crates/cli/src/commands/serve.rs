//! `serve` command implementation.

use std::process::ExitCode;

use anyhow::{Context, Result};
use config_loader::DispatchProfile;
use dispatcher::CancellationToken;
use tokio::net::TcpListener;
use tracing::info;

use super::{build_engine, shutdown_signal};
use crate::api::{router, ApiState};
use crate::cli::ServeArgs;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs, profile: &DispatchProfile) -> Result<ExitCode> {
    let bind = args
        .bind
        .clone()
        .unwrap_or_else(|| profile.server.bind.clone());

    if args.metrics_port > 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let engine = build_engine(profile)?;
    let shutdown = CancellationToken::new();
    let app = router(ApiState::new(engine, shutdown.clone()));

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(bind = %bind, "API started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Received shutdown signal, stopping API...");
            shutdown.cancel();
        })
        .await
        .context("API server failed")?;

    info!("IoT Dispatch API stopped");
    Ok(ExitCode::SUCCESS)
}
