//! Dispatcher error types
//!
//! Per-request failures are reported as data in `DispatchResult`; this covers
//! engine construction only.

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Engine settings that cannot be run
    #[error("invalid engine setting '{field}': {message}")]
    InvalidSettings { field: String, message: String },
}

impl DispatcherError {
    /// Create an invalid settings error
    pub fn invalid_settings(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            field: field.into(),
            message: message.into(),
        }
    }
}
