//! DispatchProfile - Config Loader output
//!
//! Engine tuning, registry connection, address defaults and HTTP server
//! settings. Every section is optional in the file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

use crate::DispatchRequest;

/// Profile version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dispatch profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DispatchProfile {
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub registry: RegistrySettings,

    /// Address fields used when a caller omits them
    #[serde(default)]
    pub defaults: AddressDefaults,

    #[serde(default)]
    pub server: ServerSettings,
}

/// DispatchEngine tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngineSettings {
    /// Worker pool size for batches (1 = sequential)
    #[validate(range(min = 1, max = 1024))]
    pub concurrency: usize,

    /// Per-call deadline in milliseconds (None = no deadline)
    pub call_timeout_ms: Option<u64>,

    #[validate(nested)]
    pub retry: RetryPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            call_timeout_ms: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineSettings {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

/// Bounded exponential backoff for transient registry failures
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first call
    #[validate(range(min = 1, max = 20))]
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub base_delay_ms: u64,

    /// Cap for any single delay
    pub max_delay_ms: u64,

    /// Growth factor per attempt
    #[validate(range(min = 1.0, max = 10.0))]
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Retry `max_attempts` times with a fixed base delay and no growth
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        let ms = delay.as_millis() as u64;
        Self {
            max_attempts,
            base_delay_ms: ms,
            max_delay_ms: ms,
            multiplier: 1.0,
        }
    }

    /// Sleep before the next attempt, given the 1-based attempt that just failed
    ///
    /// `min(base * multiplier^(attempt-1), max)`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let ms = self.base_delay_ms as f64 * self.multiplier.powi(exp);
        let capped = ms.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Registry backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    /// Cloud IoT REST API
    #[default]
    CloudIot,
    /// In-process mock (demos, dry environments)
    Mock,
}

/// Registry connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub kind: RegistryKind,

    /// REST base URL
    pub endpoint: String,

    /// Environment variable holding the bearer token
    pub token_env: String,

    /// HTTP client timeout in milliseconds
    pub timeout_ms: u64,

    /// Scripted behaviour for `kind = "mock"`
    pub mock: MockRegistrySettings,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            kind: RegistryKind::CloudIot,
            endpoint: default_endpoint(),
            token_env: default_token_env(),
            timeout_ms: 30_000,
            mock: MockRegistrySettings::default(),
        }
    }
}

fn default_endpoint() -> String {
    "https://cloudiot.googleapis.com/v1".to_string()
}

fn default_token_env() -> String {
    "IOT_REGISTRY_TOKEN".to_string()
}

/// Mock registry behaviour keyed by device id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MockRegistrySettings {
    /// Artificial latency per call
    pub latency_ms: u64,
    /// Devices reported as unknown
    pub not_found: Vec<String>,
    /// Devices that answer `Unavailable` this many times before succeeding
    pub flaky: HashMap<String, u32>,
}

/// Defaults for omitted address fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressDefaults {
    pub project_id: Option<String>,
    pub location: Option<String>,
    pub registry_id: Option<String>,
}

/// HTTP surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Batch file content (`[[requests]]` in TOML)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestBatch {
    #[serde(default)]
    pub requests: Vec<DispatchRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_after(1), Duration::from_millis(200));
        assert_eq!(policy.delay_after(2), Duration::from_millis(400));
        assert_eq!(policy.delay_after(3), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 1_000,
            max_delay_ms: 3_000,
            multiplier: 2.0,
        };
        assert_eq!(policy.delay_after(2), Duration::from_millis(2_000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(3_000));
        assert_eq!(policy.delay_after(60), Duration::from_millis(3_000));
    }

    #[test]
    fn test_fixed_policy() {
        let policy = RetryPolicy::fixed(4, Duration::from_millis(50));
        assert_eq!(policy.delay_after(1), Duration::from_millis(50));
        assert_eq!(policy.delay_after(3), Duration::from_millis(50));
    }

    #[test]
    fn test_engine_defaults_are_sequential() {
        let settings = EngineSettings::default();
        assert_eq!(settings.concurrency, 1);
        assert_eq!(settings.call_timeout(), None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_nested_validation_catches_zero_attempts() {
        let mut profile = DispatchProfile::default();
        profile.engine.retry.max_attempts = 0;
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts"), "got: {err}");
    }
}
