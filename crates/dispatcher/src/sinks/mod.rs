//! Sink implementations
//!
//! Contains ConsoleSink, HttpReportSink, and LogSink.

mod console;
mod http_report;
mod log;

pub use self::console::{ConsoleSink, ReportSummary};
pub use self::http_report::{aggregate_status, HttpReport, HttpReportSink};
pub use self::log::LogSink;
