//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON dispatch profiles
//! - Validate configuration legality
//! - Load request batch files
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let profile = ConfigLoader::load_from_path(Path::new("dispatch.toml")).unwrap();
//! println!("Concurrency: {}", profile.engine.concurrency);
//! ```

mod parser;
mod validator;

pub use contracts::DispatchProfile;
pub use parser::ConfigFormat;

use contracts::{ContractError, DispatchRequest};
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a dispatch profile from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<DispatchProfile, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a dispatch profile from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DispatchProfile, ContractError> {
        let profile: DispatchProfile = parser::parse(content, format)?;
        validator::validate(&profile)?;
        Ok(profile)
    }

    /// Validate an already-built profile (e.g. after CLI overrides)
    pub fn validate(profile: &DispatchProfile) -> Result<(), ContractError> {
        validator::validate(profile)
    }

    /// Load dispatch requests from a batch file
    pub fn load_requests_from_path(path: &Path) -> Result<Vec<DispatchRequest>, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        parser::parse_requests(&content, format)
    }

    /// Load dispatch requests from string
    pub fn load_requests_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<Vec<DispatchRequest>, ContractError> {
        parser::parse_requests(content, format)
    }

    /// Serialize DispatchProfile to TOML string
    pub fn to_toml(profile: &DispatchProfile) -> Result<String, ContractError> {
        toml::to_string_pretty(profile)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize DispatchProfile to JSON string
    pub fn to_json(profile: &DispatchProfile) -> Result<String, ContractError> {
        serde_json::to_string_pretty(profile)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RegistryKind;
    use std::io::Write;

    const PROFILE_TOML: &str = r#"
[engine]
concurrency = 8

[engine.retry]
max_attempts = 4
base_delay_ms = 50
max_delay_ms = 1000

[registry]
kind = "cloud_iot"
token_env = "MY_TOKEN"

[defaults]
project_id = "proj1"
location = "us-central1"
registry_id = "reg1"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let profile = ConfigLoader::load_from_str(PROFILE_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(profile.engine.concurrency, 8);
        assert_eq!(profile.registry.token_env, "MY_TOKEN");
        assert_eq!(profile.registry.kind, RegistryKind::CloudIot);
    }

    #[test]
    fn test_round_trip_toml() {
        let profile = ConfigLoader::load_from_str(PROFILE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&profile).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(again.engine.retry.max_attempts, 4);
        assert_eq!(again.defaults.registry_id.as_deref(), Some("reg1"));
    }

    #[test]
    fn test_round_trip_json() {
        let profile = ConfigLoader::load_from_str(PROFILE_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&profile).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(again.engine.concurrency, 8);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = "[engine.retry]\nbase_delay_ms = 9000\nmax_delay_ms = 10\n";
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_delay_ms"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(PROFILE_TOML.as_bytes()).unwrap();
        let profile = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(profile.engine.concurrency, 8);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_load_requests_from_path() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(
            br#"[{"deviceAddress": {"projectId": "p", "location": "l", "registryId": "r", "deviceId": "d"},
                  "payload": {"on": true}}]"#,
        )
        .unwrap();
        let requests = ConfigLoader::load_requests_from_path(file.path()).unwrap();
        assert_eq!(requests.len(), 1);
    }
}
