//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// IoT Dispatch - push configuration payloads to registry-managed devices
#[derive(Parser, Debug)]
#[command(
    name = "iot-dispatch",
    author,
    version,
    about = "Push configuration payloads to devices through a device registry",
    long_about = "Encodes configuration payloads, resolves device resource paths and \n\
                  pushes them through the device registry with bounded retry.\n\n\
                  Runs one-shot (push), over a request file (batch) or as an HTTP service (serve)."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "IOT_DISPATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "IOT_DISPATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Dispatch profile (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, global = true, env = "IOT_DISPATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Push one configuration payload to one device
    Push(PushArgs),

    /// Dispatch every request in a JSON/TOML request file
    Batch(BatchArgs),

    /// Serve the dispatch HTTP API
    Serve(ServeArgs),

    /// Validate the dispatch profile without contacting the registry
    Validate(ValidateArgs),
}

/// Arguments for the `push` command
#[derive(Args, Debug, Clone)]
pub struct PushArgs {
    /// GCP project ID (falls back to defaults.project_id)
    #[arg(long, env = "IOT_PROJECT_ID")]
    pub project: Option<String>,

    /// Cloud region (falls back to defaults.location)
    #[arg(long, env = "IOT_LOCATION")]
    pub location: Option<String>,

    /// Registry ID (falls back to defaults.registry_id)
    #[arg(long, env = "IOT_REGISTRY_ID")]
    pub registry: Option<String>,

    /// Device ID
    #[arg(long)]
    pub device: String,

    /// Configuration payload as a JSON object
    #[arg(long, conflicts_with_all = ["on", "speed"])]
    pub payload: Option<String>,

    /// Fan config: switch the fan on
    #[arg(long)]
    pub on: bool,

    /// Fan config: speed (0-100)
    #[arg(long)]
    pub speed: Option<i64>,

    /// Print the resolved path and encoded payload without calling the registry
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `batch` command
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Request file (JSON array / object with `requests`, or TOML `[[requests]]`)
    #[arg(short, long)]
    pub requests: PathBuf,

    /// Override engine.concurrency from the profile
    #[arg(long, env = "IOT_DISPATCH_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Cancel requests still pending after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "IOT_DISPATCH_TIMEOUT")]
    pub timeout: u64,

    /// Print aggregated dispatch statistics
    #[arg(long)]
    pub stats: bool,
}

/// Arguments for the `serve` command
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen address (overrides server.bind)
    #[arg(long, env = "IOT_DISPATCH_BIND")]
    pub bind: Option<String>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "IOT_DISPATCH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
