//! Dispatch 指标收集模块
//!
//! 引擎每次调用 registry 时记录 Prometheus 指标，并提供内存聚合器输出摘要。

use std::collections::BTreeMap;

use contracts::{DispatchResult, ErrorKind};
use metrics::{counter, histogram};

/// 记录一次 registry 调用尝试
pub fn record_dispatch_attempt(client: &str) {
    counter!(
        "iot_dispatch_attempts_total",
        "client" => client.to_string()
    )
    .increment(1);
}

/// 记录一次重试（attempt >= 2）
pub fn record_retry(client: &str) {
    counter!(
        "iot_dispatch_retries_total",
        "client" => client.to_string()
    )
    .increment(1);
}

/// 记录单次调用耗时 (毫秒)
pub fn record_call_latency_ms(latency_ms: f64) {
    histogram!("iot_dispatch_call_latency_ms").record(latency_ms);
}

/// 记录一个请求的最终结果
pub fn record_result(result: &DispatchResult) {
    let (status, kind) = match result.error() {
        None => ("success", "none"),
        Some(err) => ("failure", err.kind().as_str()),
    };
    counter!(
        "iot_dispatch_results_total",
        "status" => status,
        "kind" => kind
    )
    .increment(1);
}

/// Dispatch 结果聚合器
///
/// 在内存中聚合一批结果，便于 CLI 输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchSummaryAggregator {
    /// 结果总数
    pub total: u64,

    /// 成功数
    pub succeeded: u64,

    /// 失败数（不含取消）
    pub failed: u64,

    /// 被取消数
    pub cancelled: u64,

    /// 至少重试过一次的请求数
    pub retried: u64,

    /// 每个请求的调用次数统计
    pub attempt_stats: RunningStats,

    /// 各错误类型计数
    pub failure_kinds: BTreeMap<ErrorKind, u64>,
}

impl DispatchSummaryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, result: &DispatchResult) {
        self.total += 1;

        match result.error() {
            None => self.succeeded += 1,
            Some(err) if result.is_cancelled() => {
                self.cancelled += 1;
                *self.failure_kinds.entry(err.kind()).or_insert(0) += 1;
            }
            Some(err) => {
                self.failed += 1;
                *self.failure_kinds.entry(err.kind()).or_insert(0) += 1;
            }
        }

        if result.attempts() > 1 {
            self.retried += 1;
        }
        if result.attempts() > 0 {
            self.attempt_stats.push(f64::from(result.attempts()));
        }
    }

    /// 批量更新
    pub fn extend<'a>(&mut self, results: impl IntoIterator<Item = &'a DispatchResult>) {
        for result in results {
            self.update(result);
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            cancelled: self.cancelled,
            retried: self.retried,
            success_rate: if self.total > 0 {
                self.succeeded as f64 / self.total as f64 * 100.0
            } else {
                0.0
            },
            attempts: StatsSummary::from(&self.attempt_stats),
            failure_kinds: self.failure_kinds.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub retried: u64,
    pub success_rate: f64,
    pub attempts: StatsSummary,
    pub failure_kinds: BTreeMap<ErrorKind, u64>,
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Total requests: {}", self.total)?;
        writeln!(
            f,
            "Succeeded: {} ({:.2}%)",
            self.succeeded, self.success_rate
        )?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "Cancelled: {}", self.cancelled)?;
        writeln!(f, "Retried: {}", self.retried)?;
        writeln!(f, "Attempts per request: {}", self.attempts)?;

        if !self.failure_kinds.is_empty() {
            writeln!(f, "Failures by kind:")?;
            for (kind, count) in &self.failure_kinds {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.0}, max={:.0}, mean={:.2} (n={})",
                self.min, self.max, self.mean, self.count
            )
        }
    }
}

/// 在线统计 (增量均值)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
            self.mean += (value - self.mean) / self.count as f64;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
