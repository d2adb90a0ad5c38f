//! Command implementations.

mod batch;
mod push;
mod serve;
mod validate;

pub use batch::run_batch;
pub use push::run_push;
pub use serve::run_serve;
pub use validate::run_validate;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, DispatchProfile};
use dispatcher::{CancellationToken, DispatchEngine, ReportSummary};
use registry_client::{RegistryBackend, RegistryClient};
use tracing::{info, warn};

use crate::error::CliError;

/// Engine type used by every command
pub type Engine = DispatchEngine<RegistryBackend>;

/// Load the profile given by `--config`, or built-in defaults
pub fn load_profile(path: Option<&Path>) -> Result<DispatchProfile> {
    let Some(path) = path else {
        info!("No profile given, using built-in defaults");
        return Ok(DispatchProfile::default());
    };

    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    let profile = ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load profile from {}", path.display()))?;

    info!(
        config = %path.display(),
        registry = ?profile.registry.kind,
        concurrency = profile.engine.concurrency,
        max_attempts = profile.engine.retry.max_attempts,
        "Profile loaded"
    );
    Ok(profile)
}

/// Build the registry client and engine for `profile`
pub fn build_engine(profile: &DispatchProfile) -> Result<Arc<Engine>> {
    let backend = RegistryBackend::from_settings(&profile.registry)
        .context("Failed to initialize registry client")?;
    info!(client = backend.name(), "Registry client ready");

    let engine = DispatchEngine::new(backend, &profile.engine)
        .context("Failed to build dispatch engine")?;
    Ok(Arc::new(engine))
}

/// Cancel `token` on Ctrl+C / SIGTERM
pub fn cancel_on_shutdown(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => {
                warn!("Received shutdown signal, cancelling pending requests...");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Map a rendered report to the process exit code
pub fn exit_code(summary: &ReportSummary) -> ExitCode {
    if summary.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
