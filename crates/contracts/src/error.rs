//! Layered error definitions
//!
//! Categorized by source: config / payload / address / remote / dispatch

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Configuration and IO errors
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ===== Payload Errors =====

/// Payload could not be brought into (or out of) its transport form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// A value has no JSON representation (NaN, infinity)
    #[error("value at '{key}' cannot be represented in JSON: {reason}")]
    Unrepresentable { key: String, reason: String },

    /// Source value did not serialize to a JSON object
    #[error("payload must serialize to a JSON object, got {found}")]
    NotAnObject { found: String },

    /// Canonical serialization failed
    #[error("payload serialization failed: {0}")]
    Serialize(String),

    /// Transport string is not valid base64
    #[error("invalid base64 payload: {0}")]
    Base64(String),

    /// Decoded bytes are not a valid payload document
    #[error("invalid payload document: {0}")]
    Deserialize(String),
}

impl EncodingError {
    pub fn unrepresentable(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unrepresentable {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

// ===== Address Errors =====

/// Field of a `DeviceAddress`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressField {
    ProjectId,
    Location,
    RegistryId,
    DeviceId,
}

impl AddressField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectId => "project_id",
            Self::Location => "location",
            Self::RegistryId => "registry_id",
            Self::DeviceId => "device_id",
        }
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device address field cannot be used as a resource path segment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid device address field '{field}': {reason}")]
pub struct InvalidAddressError {
    pub field: AddressField,
    pub reason: String,
}

impl InvalidAddressError {
    pub fn new(field: AddressField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

// ===== Remote Errors =====

/// Typed failure reported by the device registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Credentials missing, expired or rejected
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Unknown project, registry or device
    #[error("not found: {0}")]
    NotFound(String),

    /// Transient failure, worth retrying
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Registry rejected the request as malformed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RemoteError {
    /// Only `Unavailable` is expected to succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Unauthenticated(m)
            | Self::NotFound(m)
            | Self::Unavailable(m)
            | Self::InvalidArgument(m) => m,
        }
    }
}

// ===== Dispatch Errors =====

/// Why a single dispatch did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddressError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Caller cancelled before the request could complete
    #[error("cancelled before completion")]
    Cancelled,

    /// Worker failed unexpectedly (e.g. panicked)
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Failure caused by the request itself rather than the platform
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            Self::Encoding(_)
                | Self::InvalidAddress(_)
                | Self::Remote(RemoteError::InvalidArgument(_))
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::InvalidAddress(_) => ErrorKind::InvalidAddress,
            Self::Remote(RemoteError::Unauthenticated(_)) => ErrorKind::Unauthenticated,
            Self::Remote(RemoteError::NotFound(_)) => ErrorKind::NotFound,
            Self::Remote(RemoteError::Unavailable(_)) => ErrorKind::Unavailable,
            Self::Remote(RemoteError::InvalidArgument(_)) => ErrorKind::InvalidArgument,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Flat, serializable classification of `DispatchError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Encoding,
    InvalidAddress,
    Unauthenticated,
    NotFound,
    Unavailable,
    InvalidArgument,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encoding => "encoding",
            Self::InvalidAddress => "invalid_address",
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::InvalidArgument => "invalid_argument",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
