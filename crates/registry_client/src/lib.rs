//! # Registry Client
//!
//! Device registry 客户端模块。
//!
//! Responsibilities:
//! - 实现 `contracts::RegistryClient`（Cloud IoT REST / Mock）
//! - 将 HTTP 状态映射为 `RemoteError`
//! - 按 profile 的 `[registry]` 段选择后端
//!
//! ## Feature Flags
//!
//! - `cloud-iot`: Enable the real Cloud IoT REST client (requires reqwest)

pub mod backend;
pub mod error;
pub mod mock_client;

#[cfg(feature = "cloud-iot")]
pub mod cloud_iot;

pub use backend::RegistryBackend;
pub use contracts::{CallContext, RegistryClient, RemoteError};
pub use error::{ClientError, Result};
pub use mock_client::{MockConfig, MockRegistryClient, RecordedCall};

#[cfg(feature = "cloud-iot")]
pub use cloud_iot::{BearerToken, CloudIotClient};
