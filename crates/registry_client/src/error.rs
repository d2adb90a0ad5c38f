//! Registry client setup errors
//!
//! Runtime call failures are `contracts::RemoteError`; these cover building a
//! client before any call is made.

use thiserror::Error;

/// Registry client construction error
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credentials were not supplied
    #[error("missing registry credentials: environment variable '{var}' is not set or empty")]
    MissingToken { var: String },

    /// Endpoint is not usable as a base URL
    #[error("invalid registry endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// HTTP client could not be built
    #[error("failed to build registry http client: {message}")]
    Build { message: String },

    /// Requested backend was compiled out
    #[error("registry backend '{backend}' is not available in this build")]
    Unsupported { backend: String },
}

impl ClientError {
    pub fn missing_token(var: impl Into<String>) -> Self {
        Self::MissingToken { var: var.into() }
    }

    pub fn invalid_endpoint(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ClientError>;
