//! Cloud IoT REST client
//!
//! `POST {endpoint}/{device_path}:modifyCloudToDeviceConfig` with a bearer
//! token. Credentials are acquired outside this crate and handed in as a
//! [`BearerToken`].

use std::fmt;
use std::time::Duration;

use contracts::{CallContext, RegistryClient, RegistrySettings, RemoteError};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::{ClientError, Result};

/// Longest error body echoed back into a `RemoteError`
const MAX_ERROR_BODY: usize = 512;

/// Pre-acquired OAuth access token
#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Read the token from an environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Ok(Self(token.trim().to_string())),
            _ => Err(ClientError::missing_token(var)),
        }
    }

    fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Request body of `modifyCloudToDeviceConfig`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyConfigRequest<'a> {
    binary_data: &'a str,
    /// "0" updates unconditionally
    version_to_update: &'a str,
}

/// Cloud IoT registry client
#[derive(Clone)]
pub struct CloudIotClient {
    http: reqwest::Client,
    endpoint: String,
    token: BearerToken,
}

impl CloudIotClient {
    /// Create a client for `endpoint` (e.g. `https://cloudiot.googleapis.com/v1`)
    pub fn new(endpoint: &str, token: BearerToken, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.trim_end_matches('/');
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ClientError::invalid_endpoint(
                endpoint,
                "expected an http(s) URL",
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("iot-dispatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Build {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            token,
        })
    }

    /// Build from profile settings, reading the token from `settings.token_env`
    pub fn from_settings(settings: &RegistrySettings) -> Result<Self> {
        let token = BearerToken::from_env(&settings.token_env)?;
        Self::new(
            &settings.endpoint,
            token,
            Duration::from_millis(settings.timeout_ms),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}:modifyCloudToDeviceConfig", self.endpoint, path)
    }
}

impl RegistryClient for CloudIotClient {
    fn name(&self) -> &str {
        "cloud_iot"
    }

    #[instrument(
        name = "cloud_iot_push_config",
        skip(self, encoded_payload, ctx),
        fields(path = %path, attempt = ctx.attempt)
    )]
    async fn push_config(
        &self,
        path: &str,
        encoded_payload: &str,
        ctx: &CallContext,
    ) -> std::result::Result<(), RemoteError> {
        let body = ModifyConfigRequest {
            binary_data: encoded_payload,
            version_to_update: "0",
        };

        let mut request = self
            .http
            .post(self.url(path))
            .bearer_auth(self.token.secret())
            .json(&body);
        if let Some(timeout) = ctx.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "config accepted");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(status, &text);
        warn!(status = status.as_u16(), error = %message, "registry rejected config");
        Err(map_status(status, message))
    }
}

/// HTTP status -> typed remote error
pub fn map_status(status: StatusCode, message: String) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthenticated(message),
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            RemoteError::Unavailable(message)
        }
        s if s.is_server_error() => RemoteError::Unavailable(message),
        _ => RemoteError::InvalidArgument(message),
    }
}

/// Connect / timeout / body errors are all treated as transient
fn transport_error(err: reqwest::Error) -> RemoteError {
    let reason = if err.is_timeout() {
        "deadline exceeded"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "transport error"
    };
    RemoteError::Unavailable(format!("{reason}: {err}"))
}

fn error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("registry replied {status}");
    }
    let mut end = body.len().min(MAX_ERROR_BODY);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("registry replied {status}: {}", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const PATH: &str = "projects/proj1/locations/us-central1/registries/reg1/devices/dev1";
    const MOCK_PATH: &str =
        "/v1/projects/proj1/locations/us-central1/registries/reg1/devices/dev1:modifyCloudToDeviceConfig";

    fn client_for(server: &mockito::Server) -> CloudIotClient {
        CloudIotClient::new(
            &format!("{}/v1/", server.url()),
            BearerToken::new("secret-token"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_push_config_sends_expected_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", MOCK_PATH)
            .match_header("authorization", "Bearer secret-token")
            .match_body(Matcher::Json(serde_json::json!({
                "binaryData": "eyJvbiI6dHJ1ZSwic3BlZWQiOjQwfQ==",
                "versionToUpdate": "0"
            })))
            .with_status(200)
            .with_body(r#"{"version": "3"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        client
            .push_config(PATH, "eyJvbiI6dHJ1ZSwic3BlZWQiOjQwfQ==", &CallContext::default())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_push_config_maps_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", MOCK_PATH)
            .with_status(404)
            .with_body(r#"{"error": {"message": "device not found"}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .push_config(PATH, "e30=", &CallContext::default())
            .await
            .unwrap_err();
        match err {
            RemoteError::NotFound(message) => assert!(message.contains("device not found")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_push_config_server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", MOCK_PATH)
            .with_status(503)
            .create_async()
            .await;

        let err = client_for(&server)
            .push_config(PATH, "e30=", &CallContext::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "got: {err:?}");
    }

    #[test]
    fn test_status_mapping() {
        let m = || String::from("x");
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, m()),
            RemoteError::Unauthenticated(_)
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, m()),
            RemoteError::Unauthenticated(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_REQUEST, m()),
            RemoteError::InvalidArgument(_)
        ));
        assert!(matches!(
            map_status(StatusCode::CONFLICT, m()),
            RemoteError::InvalidArgument(_)
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, m()),
            RemoteError::Unavailable(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, m()),
            RemoteError::Unavailable(_)
        ));
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let result = CloudIotClient::new(
            "cloudiot.googleapis.com",
            BearerToken::new("t"),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(ClientError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("super-secret");
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
    }

    #[test]
    fn test_error_message_truncates_long_bodies() {
        let body = "x".repeat(2_000);
        let message = error_message(StatusCode::BAD_REQUEST, &body);
        assert!(message.len() < 600);
    }
}
