//! # Dispatcher
//!
//! 配置分发模块。
//!
//! 负责：
//! - 编码 payload、解析设备路径、调用 `RegistryClient`
//! - 对瞬时故障做有界指数退避重试
//! - 批量分发：有界并发、保持输入顺序、支持取消
//! - 通过 `ResultSink` 渲染结果（console / HTTP / log）

pub mod engine;
pub mod error;
pub mod metrics;
pub mod sinks;
mod worker;

pub use contracts::{DispatchRequest, DispatchResult, ResultSink};
pub use engine::DispatchEngine;
pub use error::DispatcherError;
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use sinks::{aggregate_status, ConsoleSink, HttpReport, HttpReportSink, LogSink, ReportSummary};
pub use tokio_util::sync::CancellationToken;
