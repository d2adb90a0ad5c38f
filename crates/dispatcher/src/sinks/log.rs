//! LogSink - reports outcomes via tracing

use contracts::{DispatchResult, ResultSink};
use tracing::{info, instrument, warn};

use super::ReportSummary;

/// Sink that logs one event per result, then a summary
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ResultSink for LogSink {
    type Output = ReportSummary;

    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_render",
        skip(self, results),
        fields(sink = %self.name, count = results.len())
    )]
    fn render(&mut self, results: &[DispatchResult]) -> ReportSummary {
        for result in results {
            match result.error() {
                None => info!(
                    sink = %self.name,
                    address = %result.address(),
                    attempts = result.attempts(),
                    "device configured"
                ),
                Some(err) => warn!(
                    sink = %self.name,
                    address = %result.address(),
                    attempts = result.attempts(),
                    kind = %err.kind(),
                    error = %err,
                    "device not configured"
                ),
            }
        }

        let summary = ReportSummary::from_results(results);
        info!(
            sink = %self.name,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "dispatch report"
        );
        summary
    }
}
