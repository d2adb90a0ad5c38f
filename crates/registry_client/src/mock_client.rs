//! Mock registry 客户端
//!
//! 用于单元测试的 mock 实现，支持注入失败场景并记录每一次调用。

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{CallContext, MockRegistrySettings, RegistryClient, RemoteError};
use tracing::{debug, instrument};

/// 默认保留的调用记录条数
pub const DEFAULT_CALL_LOG_CAPACITY: usize = 1024;

/// Mock 客户端配置
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// 永久失败的 device IDs 及其错误
    pub fail_devices: HashMap<String, RemoteError>,
    /// 先返回 N 次 `Unavailable` 再成功的 device IDs
    pub transient_failures: HashMap<String, u32>,
    /// 每次调用的模拟延迟
    pub latency: Duration,
    /// 调用记录上限，`None` 为 [`DEFAULT_CALL_LOG_CAPACITY`]
    pub call_log_capacity: Option<usize>,
}

impl MockConfig {
    /// 设备永久失败
    pub fn fail_device(mut self, device_id: impl Into<String>, error: RemoteError) -> Self {
        self.fail_devices.insert(device_id.into(), error);
        self
    }

    /// 设备前 `failures` 次调用返回 `Unavailable`
    pub fn flaky_device(mut self, device_id: impl Into<String>, failures: u32) -> Self {
        self.transient_failures.insert(device_id.into(), failures);
        self
    }

    /// 设备始终返回 `Unavailable`
    pub fn unavailable_device(self, device_id: impl Into<String>) -> Self {
        self.flaky_device(device_id, u32::MAX)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// 只保留最近 `capacity` 条调用记录
    pub fn with_call_log_capacity(mut self, capacity: usize) -> Self {
        self.call_log_capacity = Some(capacity);
        self
    }
}

impl From<&MockRegistrySettings> for MockConfig {
    fn from(settings: &MockRegistrySettings) -> Self {
        let fail_devices = settings
            .not_found
            .iter()
            .map(|id| {
                (
                    id.clone(),
                    RemoteError::NotFound(format!("device '{id}' is not registered")),
                )
            })
            .collect();

        Self {
            fail_devices,
            transient_failures: settings.flaky.clone(),
            latency: Duration::from_millis(settings.latency_ms),
            call_log_capacity: None,
        }
    }
}

/// 一次被记录的调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub path: String,
    pub encoded_payload: String,
    pub attempt: u32,
}

/// Mock registry 客户端
pub struct MockRegistryClient {
    name: String,
    /// 配置（可注入失败场景）
    config: MockConfig,
    /// 最近的调用记录（按到达顺序，有上限）
    calls: Mutex<VecDeque<RecordedCall>>,
    call_log_capacity: usize,
    /// flaky device_id -> 已收到的调用次数
    flaky_calls: Mutex<HashMap<String, u32>>,
    call_count: AtomicU64,
}

impl MockRegistryClient {
    /// 创建默认 mock 客户端（全部成功）
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock 客户端
    pub fn with_config(config: MockConfig) -> Self {
        let call_log_capacity = config
            .call_log_capacity
            .unwrap_or(DEFAULT_CALL_LOG_CAPACITY);
        Self {
            name: "mock".to_string(),
            config,
            calls: Mutex::new(VecDeque::new()),
            call_log_capacity,
            flaky_calls: Mutex::new(HashMap::new()),
            call_count: AtomicU64::new(0),
        }
    }

    /// 总调用次数
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// 保留的调用记录中指定设备的调用次数
    pub fn calls_for(&self, device: &str) -> u32 {
        let calls = lock(&self.calls);
        let count = calls.iter().filter(|c| device_id(&c.path) == device).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// 保留的调用记录（最旧在前）
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).iter().cloned().collect()
    }

    /// 记录调用，返回 flaky 设备的第几次调用（其余设备为 0）
    fn record(&self, path: &str, encoded_payload: &str, ctx: &CallContext) -> u32 {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.call_log_capacity > 0 {
            let mut calls = lock(&self.calls);
            if calls.len() == self.call_log_capacity {
                calls.pop_front();
            }
            calls.push_back(RecordedCall {
                path: path.to_string(),
                encoded_payload: encoded_payload.to_string(),
                attempt: ctx.attempt,
            });
        }

        let device = device_id(path);
        if !self.config.transient_failures.contains_key(device) {
            return 0;
        }
        let mut flaky_calls = lock(&self.flaky_calls);
        let count = flaky_calls.entry(device.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    fn outcome(&self, device: &str, nth_call: u32) -> Result<(), RemoteError> {
        if let Some(err) = self.config.fail_devices.get(device) {
            return Err(err.clone());
        }
        match self.config.transient_failures.get(device) {
            Some(&failures) if nth_call <= failures => Err(RemoteError::Unavailable(format!(
                "mock registry temporarily unavailable (call {nth_call})"
            ))),
            _ => Ok(()),
        }
    }
}

impl Default for MockRegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient for MockRegistryClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "mock_registry_push_config",
        skip(self, encoded_payload, ctx),
        fields(path = %path, attempt = ctx.attempt)
    )]
    async fn push_config(
        &self,
        path: &str,
        encoded_payload: &str,
        ctx: &CallContext,
    ) -> Result<(), RemoteError> {
        let nth_call = self.record(path, encoded_payload, ctx);

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let result = self.outcome(device_id(path), nth_call);
        debug!(ok = result.is_ok(), "mock push_config");
        result
    }
}

/// 取路径最后一段作为 device ID
fn device_id(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
