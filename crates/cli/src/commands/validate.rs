//! `validate` command implementation.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, DispatchProfile};
use contracts::RegistryKind;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ProfileSummary>,
}

#[derive(Serialize)]
struct ProfileSummary {
    version: String,
    registry: String,
    endpoint: String,
    concurrency: usize,
    max_attempts: u32,
    bind: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs, config: Option<&Path>) -> Result<ExitCode> {
    let Some(config) = config else {
        anyhow::bail!("No profile to validate: pass --config <path>");
    };
    info!(config = %config.display(), "Validating profile");

    let result = validate_profile(config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(ExitCode::SUCCESS)
    } else {
        anyhow::bail!("Profile validation failed")
    }
}

fn validate_profile(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();

    // Check file exists
    if !path.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", path.display())),
            warnings: None,
            summary: None,
        };
    }

    match ConfigLoader::load_from_path(path) {
        Ok(profile) => {
            let warnings = collect_warnings(&profile);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ProfileSummary {
                    version: format!("{:?}", profile.version),
                    registry: format!("{:?}", profile.registry.kind),
                    endpoint: profile.registry.endpoint.clone(),
                    concurrency: profile.engine.concurrency,
                    max_attempts: profile.engine.retry.max_attempts,
                    bind: profile.server.bind.clone(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect profile warnings (non-fatal issues)
fn collect_warnings(profile: &DispatchProfile) -> Vec<String> {
    let mut warnings = Vec::new();

    match profile.registry.kind {
        RegistryKind::Mock => {
            warnings.push("registry.kind is 'mock' - no device will be configured".to_string());
        }
        RegistryKind::CloudIot => {
            let token_set = std::env::var(&profile.registry.token_env)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            if !token_set {
                warnings.push(format!(
                    "Environment variable '{}' is not set - push/batch/serve will fail to start",
                    profile.registry.token_env
                ));
            }
        }
    }

    if profile.engine.call_timeout_ms.is_none() {
        warnings.push(
            "engine.call_timeout_ms is not set - calls are bounded by registry.timeout_ms only"
                .to_string(),
        );
    }

    let defaults = &profile.defaults;
    if defaults.project_id.is_none() || defaults.location.is_none() || defaults.registry_id.is_none()
    {
        warnings.push(
            "defaults are incomplete - push needs --project/--location/--registry".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Profile is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Registry: {} ({})", summary.registry, summary.endpoint);
            println!("  Concurrency: {}", summary.concurrency);
            println!("  Max attempts: {}", summary.max_attempts);
            println!("  Bind: {}", summary.bind);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Profile is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
