//! `batch` command implementation.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, DispatchProfile};
use dispatcher::{CancellationToken, ConsoleSink, ResultSink};
use observability::DispatchSummaryAggregator;
use tracing::{info, warn};

use super::{build_engine, cancel_on_shutdown, exit_code};
use crate::cli::BatchArgs;
use crate::error::CliError;

/// Execute the `batch` command
pub async fn run_batch(args: &BatchArgs, profile: &DispatchProfile) -> Result<ExitCode> {
    info!(requests = %args.requests.display(), "Loading requests");

    if !args.requests.exists() {
        return Err(CliError::config_not_found(args.requests.display().to_string()).into());
    }

    let requests = ConfigLoader::load_requests_from_path(&args.requests)
        .with_context(|| format!("Failed to load requests from {}", args.requests.display()))?;

    // Apply CLI overrides
    let mut profile = profile.clone();
    if let Some(concurrency) = args.concurrency {
        info!(concurrency, "Overriding concurrency from CLI");
        profile.engine.concurrency = concurrency;
        ConfigLoader::validate(&profile).context("Invalid --concurrency")?;
    }

    let engine = build_engine(&profile)?;
    let token = CancellationToken::new();
    cancel_on_shutdown(&token);
    if args.timeout > 0 {
        cancel_after(&token, Duration::from_secs(args.timeout));
    }

    info!(
        requests = requests.len(),
        concurrency = engine.concurrency(),
        "Starting batch dispatch..."
    );
    let started = Instant::now();
    let results = engine.dispatch_many(requests, &token).await;
    token.cancel();

    let metrics = engine.metrics();
    info!(
        attempts = metrics.attempts,
        retries = metrics.retries,
        duration_secs = started.elapsed().as_secs_f64(),
        "Batch dispatch finished"
    );

    let summary = ConsoleSink::stdout().render(&results);

    if args.stats {
        let mut aggregator = DispatchSummaryAggregator::new();
        aggregator.extend(&results);
        println!("\n{}", aggregator.summary());
    }

    Ok(exit_code(&summary))
}

/// Cancel whatever has not started once `limit` elapses
fn cancel_after(token: &CancellationToken, limit: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(limit) => {
                warn!(timeout_secs = limit.as_secs(), "Batch timeout reached, cancelling pending requests");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
}
