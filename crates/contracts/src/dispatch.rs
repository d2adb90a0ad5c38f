//! DispatchRequest / DispatchResult - DispatchEngine input and output

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConfigPayload, DeviceAddress, DispatchError, ErrorKind};

/// One configuration update for one device
///
/// Immutable once built, consumed by value by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    #[serde(rename = "deviceAddress")]
    address: DeviceAddress,
    payload: ConfigPayload,
}

impl DispatchRequest {
    pub fn new(address: DeviceAddress, payload: impl Into<ConfigPayload>) -> Self {
        Self {
            address,
            payload: payload.into(),
        }
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn payload(&self) -> &ConfigPayload {
        &self.payload
    }

    pub fn into_parts(self) -> (DeviceAddress, ConfigPayload) {
        (self.address, self.payload)
    }
}

/// Outcome of dispatching one request
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    address: DeviceAddress,
    path: Option<String>,
    error: Option<DispatchError>,
    attempts: u32,
    timestamp: DateTime<Utc>,
}

impl DispatchResult {
    /// Successful dispatch after `attempts` remote calls
    pub fn succeeded(address: DeviceAddress, path: String, attempts: u32) -> Self {
        Self {
            address,
            path: Some(path),
            error: None,
            attempts,
            timestamp: Utc::now(),
        }
    }

    /// Failed dispatch; `path` is `None` when resolution itself failed
    pub fn failed(
        address: DeviceAddress,
        path: Option<String>,
        error: DispatchError,
        attempts: u32,
    ) -> Self {
        Self {
            address,
            path,
            error: Some(error),
            attempts,
            timestamp: Utc::now(),
        }
    }

    /// Request never started because the caller cancelled
    pub fn cancelled(address: DeviceAddress) -> Self {
        Self::failed(address, None, DispatchError::Cancelled, 0)
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, Some(DispatchError::Cancelled))
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn error(&self) -> Option<&DispatchError> {
        self.error.as_ref()
    }

    /// Number of remote calls made (0 if none)
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Serializable view for reports
    pub fn to_record(&self) -> OutcomeRecord {
        OutcomeRecord {
            device_address: self.address.clone(),
            device_path: self.path.clone(),
            success: self.success(),
            attempts: self.attempts,
            timestamp: self.timestamp,
            error: self.error.as_ref().map(ErrorDetail::from),
        }
    }
}

/// Per-device outcome as reported to HTTP / JSON consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub device_address: DeviceAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_path: Option<String>,
    pub success: bool,
    pub attempts: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

/// Error kind plus human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&DispatchError> for ErrorDetail {
    fn from(err: &DispatchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
