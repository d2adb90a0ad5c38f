//! # IoT Dispatch CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 单设备配置推送与 dry-run
//! - 批量分发（有界并发、Ctrl+C 取消）
//! - HTTP 分发服务
//! - Profile 验证

mod api;
mod cli;
mod commands;
mod error;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{load_profile, run_batch, run_push, run_serve, run_validate};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    observability::init_with_config(ObservabilityConfig::from_verbosity(
        cli.log_format.into(),
        cli.verbose,
        cli.quiet,
    ))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "IoT Dispatch CLI starting"
    );

    // Execute command
    let result = execute(&cli).await;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

async fn execute(cli: &Cli) -> Result<ExitCode> {
    let config = cli.config.as_deref();
    if let Commands::Validate(args) = &cli.command {
        return run_validate(args, config);
    }

    let profile = load_profile(config)?;
    match &cli.command {
        Commands::Push(args) => run_push(args, &profile).await,
        Commands::Batch(args) => run_batch(args, &profile).await,
        Commands::Serve(args) => run_serve(args, &profile).await,
        Commands::Validate(args) => run_validate(args, config),
    }
}
