//! `push` command implementation.

use std::process::ExitCode;

use anyhow::{Context, Result};
use contracts::{
    ConfigPayload, DeviceAddress, DispatchRequest, FanConfig, PathResolver, PayloadEncoder,
};
use config_loader::DispatchProfile;
use dispatcher::{CancellationToken, ConsoleSink, ResultSink};
use tracing::info;

use super::{build_engine, cancel_on_shutdown, exit_code};
use crate::cli::PushArgs;
use crate::error::CliError;

/// Execute the `push` command
pub async fn run_push(args: &PushArgs, profile: &DispatchProfile) -> Result<ExitCode> {
    let request = build_request(args, profile)?;

    if args.dry_run {
        info!("Dry run mode - registry will not be called");
        print_dry_run(&request)?;
        return Ok(ExitCode::SUCCESS);
    }

    let engine = build_engine(profile)?;
    let token = CancellationToken::new();
    cancel_on_shutdown(&token);

    let result = engine.dispatch_one_with(request, &token).await;
    token.cancel();

    let summary = ConsoleSink::stdout().render(std::slice::from_ref(&result));
    Ok(exit_code(&summary))
}

/// Address from flags / env, falling back to profile defaults
fn resolve_address(args: &PushArgs, profile: &DispatchProfile) -> Result<DeviceAddress, CliError> {
    let defaults = &profile.defaults;
    let pick = |flag: &Option<String>,
                default: &Option<String>,
                flag_name: &'static str,
                profile_key: &'static str| {
        flag.clone()
            .or_else(|| default.clone())
            .ok_or(CliError::MissingAddressField {
                flag: flag_name,
                profile_key,
            })
    };

    Ok(DeviceAddress::new(
        pick(&args.project, &defaults.project_id, "project", "project_id")?,
        pick(&args.location, &defaults.location, "location", "location")?,
        pick(&args.registry, &defaults.registry_id, "registry", "registry_id")?,
        args.device.clone(),
    ))
}

/// `--payload` JSON object, or a fan config from `--on/--speed`
fn build_payload(args: &PushArgs) -> Result<ConfigPayload> {
    if let Some(raw) = &args.payload {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| CliError::invalid_payload(e.to_string()))?;
        let payload =
            ConfigPayload::try_from(value).map_err(|e| CliError::invalid_payload(e.to_string()))?;
        return Ok(payload);
    }

    let speed = args.speed.ok_or(CliError::MissingPayload)?;
    let fan = FanConfig::new(args.on, speed).context("Invalid fan configuration")?;
    Ok(fan.into())
}

fn build_request(args: &PushArgs, profile: &DispatchProfile) -> Result<DispatchRequest> {
    let address = resolve_address(args, profile)?;
    let payload = build_payload(args)?;
    Ok(DispatchRequest::new(address, payload))
}

fn print_dry_run(request: &DispatchRequest) -> Result<()> {
    let path = PathResolver::resolve(request.address()).context("Invalid device address")?;
    let encoded = PayloadEncoder::encode(request.payload()).context("Payload cannot be encoded")?;

    println!("\n=== Dry Run ===\n");
    println!("  Path:    {}", path);
    println!("  Payload: {}", String::from_utf8_lossy(encoded.canonical()));
    println!("  Base64:  {}", encoded.as_base64());
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> PushArgs {
        PushArgs {
            project: Some("proj1".into()),
            location: Some("us-central1".into()),
            registry: Some("reg1".into()),
            device: "dev1".into(),
            payload: None,
            on: true,
            speed: Some(40),
            dry_run: true,
        }
    }

    #[test]
    fn test_build_request_from_fan_flags() {
        let request = build_request(&args(), &DispatchProfile::default()).unwrap();
        let encoded = PayloadEncoder::encode(request.payload()).unwrap();
        assert_eq!(encoded.as_base64(), "eyJvbiI6dHJ1ZSwic3BlZWQiOjQwfQ==");
        assert_eq!(request.address().device_id, "dev1");
    }

    #[test]
    fn test_address_falls_back_to_profile_defaults() {
        let mut args = args();
        args.project = None;
        let mut profile = DispatchProfile::default();
        profile.defaults.project_id = Some("from-profile".into());

        let address = resolve_address(&args, &profile).unwrap();
        assert_eq!(address.project_id, "from-profile");
    }

    #[test]
    fn test_missing_address_field() {
        let mut args = args();
        args.registry = None;
        let err = resolve_address(&args, &DispatchProfile::default()).unwrap_err();
        assert!(err.to_string().contains("--registry"));
    }

    #[test]
    fn test_payload_json_must_be_object() {
        let mut args = args();
        args.payload = Some("[1, 2]".into());
        args.speed = None;
        let err = build_payload(&args).unwrap_err();
        assert!(err.to_string().contains("Invalid --payload"));
    }

    #[test]
    fn test_payload_json_object() {
        let mut args = args();
        args.payload = Some(r#"{"speed": 10, "on": false}"#.into());
        args.speed = None;
        let payload = build_payload(&args).unwrap();
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn test_fan_speed_out_of_range() {
        let mut args = args();
        args.speed = Some(150);
        assert!(build_payload(&args).is_err());
    }

    #[test]
    fn test_no_payload_given() {
        let mut args = args();
        args.speed = None;
        let err = build_payload(&args).unwrap_err();
        assert!(err.to_string().contains("No payload given"));
    }
}
