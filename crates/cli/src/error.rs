//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// An address field was neither given on the command line nor in the profile
    #[error("Missing device address field: pass --{flag} or set defaults.{profile_key} in the profile")]
    MissingAddressField {
        flag: &'static str,
        profile_key: &'static str,
    },

    /// Neither --payload nor the fan flags were given
    #[error("No payload given: pass --payload '<json>' or --speed <0-100> [--on]")]
    MissingPayload,

    /// --payload is not a JSON object
    #[error("Invalid --payload: {message}")]
    InvalidPayload { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}
