//! RegistryClient trait - the only network boundary
//!
//! Pushes one encoded configuration to one device. Implementations must be
//! safe to share between concurrent dispatches.

use std::time::Duration;

use crate::RemoteError;

/// Per-call context handed to the registry client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// 1-based attempt number for this request
    pub attempt: u32,
    /// Upper bound for this call, if any
    pub timeout: Option<Duration>,
}

impl CallContext {
    pub fn new(attempt: u32, timeout: Option<Duration>) -> Self {
        Self { attempt, timeout }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new(1, None)
    }
}

/// Device registry capability
#[trait_variant::make(RegistryClient: Send)]
pub trait LocalRegistryClient {
    /// Client name (used for logging)
    fn name(&self) -> &str;

    /// Replace the configuration of the device at `path`
    ///
    /// # Arguments
    /// * `path` - `projects/{p}/locations/{l}/registries/{r}/devices/{d}`
    /// * `encoded_payload` - base64 of the canonical payload bytes
    ///
    /// # Errors
    /// Typed `RemoteError`; only `Unavailable` is worth retrying.
    async fn push_config(
        &self,
        path: &str,
        encoded_payload: &str,
        ctx: &CallContext,
    ) -> Result<(), RemoteError>;
}
