//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (concurrency / max_attempts / multiplier)，由 `validator` derive 完成
//! - base_delay_ms <= max_delay_ms
//! - call_timeout_ms > 0 (若设置)
//! - cloud_iot 模式下 endpoint 与 token_env 不能为空
//! - server.bind 可解析为 SocketAddr

use std::net::SocketAddr;

use contracts::{ContractError, DispatchProfile, RegistryKind};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 DispatchProfile 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(profile: &DispatchProfile) -> Result<(), ContractError> {
    validate_ranges(profile)?;
    validate_retry_delays(profile)?;
    validate_call_timeout(profile)?;
    validate_registry(profile)?;
    validate_server(profile)?;
    Ok(())
}

/// derive 规则
fn validate_ranges(profile: &DispatchProfile) -> Result<(), ContractError> {
    profile.validate().map_err(|errors| {
        let (field, message) = first_error(&errors, "");
        ContractError::config_validation(field, message)
    })
}

/// 展开嵌套错误，取第一个字段
fn first_error(errors: &ValidationErrors, prefix: &str) -> (String, String) {
    for (name, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let message = list
                    .first()
                    .map(|e| format!("{path} out of range ({})", e.code))
                    .unwrap_or_else(|| format!("{path} is invalid"));
                return (path, message);
            }
            ValidationErrorsKind::Struct(inner) => return first_error(inner, &path),
            ValidationErrorsKind::List(items) => {
                if let Some((idx, inner)) = items.iter().next() {
                    return first_error(inner, &format!("{path}[{idx}]"));
                }
            }
        }
    }
    (prefix.to_string(), "invalid configuration".to_string())
}

/// 校验退避区间
fn validate_retry_delays(profile: &DispatchProfile) -> Result<(), ContractError> {
    let retry = &profile.engine.retry;
    if retry.base_delay_ms > retry.max_delay_ms {
        return Err(ContractError::config_validation(
            "engine.retry.base_delay_ms / engine.retry.max_delay_ms",
            format!(
                "base_delay_ms ({}) must be <= max_delay_ms ({})",
                retry.base_delay_ms, retry.max_delay_ms
            ),
        ));
    }
    Ok(())
}

fn validate_call_timeout(profile: &DispatchProfile) -> Result<(), ContractError> {
    if profile.engine.call_timeout_ms == Some(0) {
        return Err(ContractError::config_validation(
            "engine.call_timeout_ms",
            "call_timeout_ms must be > 0 when set",
        ));
    }
    Ok(())
}

/// 校验 registry 连接配置
fn validate_registry(profile: &DispatchProfile) -> Result<(), ContractError> {
    let registry = &profile.registry;
    if registry.kind != RegistryKind::CloudIot {
        return Ok(());
    }

    if registry.endpoint.trim().is_empty() {
        return Err(ContractError::config_validation(
            "registry.endpoint",
            "endpoint cannot be empty for cloud_iot registry",
        ));
    }
    if !registry.endpoint.starts_with("http://") && !registry.endpoint.starts_with("https://") {
        return Err(ContractError::config_validation(
            "registry.endpoint",
            format!("endpoint '{}' must be an http(s) URL", registry.endpoint),
        ));
    }
    if registry.token_env.trim().is_empty() {
        return Err(ContractError::config_validation(
            "registry.token_env",
            "token_env cannot be empty for cloud_iot registry",
        ));
    }
    if registry.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "registry.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }
    Ok(())
}

fn validate_server(profile: &DispatchProfile) -> Result<(), ContractError> {
    profile
        .server
        .bind
        .parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|e| {
            ContractError::config_validation(
                "server.bind",
                format!("invalid bind address '{}': {e}", profile.server.bind),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_valid() {
        assert!(validate(&DispatchProfile::default()).is_ok());
    }

    #[test]
    fn test_zero_concurrency() {
        let mut profile = DispatchProfile::default();
        profile.engine.concurrency = 0;
        let err = validate(&profile).unwrap_err().to_string();
        assert!(err.contains("engine.concurrency"), "got: {err}");
    }

    #[test]
    fn test_zero_attempts() {
        let mut profile = DispatchProfile::default();
        profile.engine.retry.max_attempts = 0;
        let err = validate(&profile).unwrap_err().to_string();
        assert!(err.contains("engine.retry.max_attempts"), "got: {err}");
    }

    #[test]
    fn test_shrinking_multiplier() {
        let mut profile = DispatchProfile::default();
        profile.engine.retry.multiplier = 0.5;
        let err = validate(&profile).unwrap_err().to_string();
        assert!(err.contains("multiplier"), "got: {err}");
    }

    #[test]
    fn test_inverted_delays() {
        let mut profile = DispatchProfile::default();
        profile.engine.retry.base_delay_ms = 10_000;
        profile.engine.retry.max_delay_ms = 100;
        let err = validate(&profile).unwrap_err().to_string();
        assert!(err.contains("must be <= max_delay_ms"), "got: {err}");
    }

    #[test]
    fn test_zero_call_timeout() {
        let mut profile = DispatchProfile::default();
        profile.engine.call_timeout_ms = Some(0);
        assert!(validate(&profile).is_err());
    }

    #[test]
    fn test_cloud_iot_requires_endpoint() {
        let mut profile = DispatchProfile::default();
        profile.registry.endpoint = String::new();
        let err = validate(&profile).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");

        profile.registry.endpoint = "ftp://example.com".into();
        let err = validate(&profile).unwrap_err().to_string();
        assert!(err.contains("http(s)"), "got: {err}");
    }

    #[test]
    fn test_mock_registry_skips_endpoint_checks() {
        let mut profile = DispatchProfile::default();
        profile.registry.kind = RegistryKind::Mock;
        profile.registry.endpoint = String::new();
        profile.registry.token_env = String::new();
        assert!(validate(&profile).is_ok());
    }

    #[test]
    fn test_bad_bind_address() {
        let mut profile = DispatchProfile::default();
        profile.server.bind = "not-an-address".into();
        let err = validate(&profile).unwrap_err().to_string();
        assert!(err.contains("server.bind"), "got: {err}");
    }
}
