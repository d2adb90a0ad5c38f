//! 按配置选择 registry 后端

use contracts::{CallContext, RegistryClient, RegistryKind, RegistrySettings, RemoteError};

#[cfg(feature = "cloud-iot")]
use crate::cloud_iot::CloudIotClient;
use crate::error::Result;
use crate::mock_client::{MockConfig, MockRegistryClient};

/// 运行期选定的 registry 客户端
pub enum RegistryBackend {
    #[cfg(feature = "cloud-iot")]
    CloudIot(CloudIotClient),
    Mock(MockRegistryClient),
}

impl RegistryBackend {
    /// 根据 `[registry]` 配置段构建客户端
    ///
    /// # Errors
    /// - `cloud_iot` 缺少 token 环境变量
    /// - 编译时未启用 `cloud-iot` feature
    pub fn from_settings(settings: &RegistrySettings) -> Result<Self> {
        match settings.kind {
            #[cfg(feature = "cloud-iot")]
            RegistryKind::CloudIot => Ok(Self::CloudIot(CloudIotClient::from_settings(settings)?)),
            #[cfg(not(feature = "cloud-iot"))]
            RegistryKind::CloudIot => Err(crate::error::ClientError::Unsupported {
                backend: "cloud_iot".to_string(),
            }),
            RegistryKind::Mock => Ok(Self::Mock(MockRegistryClient::with_config(
                MockConfig::from(&settings.mock),
            ))),
        }
    }
}

impl RegistryClient for RegistryBackend {
    fn name(&self) -> &str {
        match self {
            #[cfg(feature = "cloud-iot")]
            Self::CloudIot(client) => client.name(),
            Self::Mock(client) => client.name(),
        }
    }

    async fn push_config(
        &self,
        path: &str,
        encoded_payload: &str,
        ctx: &CallContext,
    ) -> std::result::Result<(), RemoteError> {
        match self {
            #[cfg(feature = "cloud-iot")]
            Self::CloudIot(client) => client.push_config(path, encoded_payload, ctx).await,
            Self::Mock(client) => client.push_config(path, encoded_payload, ctx).await,
        }
    }
}
