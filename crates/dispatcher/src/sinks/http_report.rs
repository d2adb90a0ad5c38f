//! HttpReportSink - per-device outcomes plus an aggregate HTTP status

use contracts::{DispatchResult, OutcomeRecord, ResultSink};
use serde::Serialize;
use tracing::instrument;

/// Rendered HTTP response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpReport {
    pub status: u16,
    /// One outcome per request, in input order
    pub body: Vec<OutcomeRecord>,
}

impl HttpReport {
    pub fn body_json(&self) -> String {
        serde_json::to_string(&self.body).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Aggregate status for a batch
///
/// - 200: every request succeeded (or no requests)
/// - 207: some succeeded, some failed
/// - 400: all failed, each one because of the request itself
/// - 500: all failed otherwise
pub fn aggregate_status(results: &[DispatchResult]) -> u16 {
    let succeeded = results.iter().filter(|r| r.success()).count();
    if succeeded == results.len() {
        return 200;
    }
    if succeeded > 0 {
        return 207;
    }

    let all_caller_faults = results
        .iter()
        .filter_map(DispatchResult::error)
        .all(|e| e.is_caller_fault());
    if all_caller_faults {
        400
    } else {
        500
    }
}

#[derive(Debug, Default)]
pub struct HttpReportSink;

impl HttpReportSink {
    pub fn new() -> Self {
        Self
    }
}

impl ResultSink for HttpReportSink {
    type Output = HttpReport;

    fn name(&self) -> &str {
        "http_report"
    }

    #[instrument(name = "http_report_render", skip_all, fields(count = results.len()))]
    fn render(&mut self, results: &[DispatchResult]) -> HttpReport {
        HttpReport {
            status: aggregate_status(results),
            body: results.iter().map(DispatchResult::to_record).collect(),
        }
    }
}
