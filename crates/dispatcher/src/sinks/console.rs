//! ConsoleSink - one line per device plus a summary

use std::io::{self, Write};

use contracts::{DispatchResult, ResultSink};
use serde::Serialize;
use tracing::warn;

/// Counts of a rendered batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub succeeded: usize,
    /// Failures other than cancellation
    pub failed: usize,
    pub cancelled: usize,
}

impl ReportSummary {
    pub fn from_results(results: &[DispatchResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            if result.success() {
                summary.succeeded += 1;
            } else if result.is_cancelled() {
                summary.cancelled += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }

    /// Process exit code: 0 when every request succeeded
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }
}

/// Writes a human-readable report to any writer (stdout by default)
pub struct ConsoleSink<W: Write> {
    name: String,
    writer: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            name: "console".to_string(),
            writer,
        }
    }

    /// Consume the sink and return the writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_report(&mut self, results: &[DispatchResult], summary: &ReportSummary) -> io::Result<()> {
        for result in results {
            writeln!(self.writer, "{}", format_line(result))?;
        }
        writeln!(
            self.writer,
            "{} succeeded, {} failed, {} cancelled ({} total)",
            summary.succeeded, summary.failed, summary.cancelled, summary.total
        )?;
        self.writer.flush()
    }
}

impl<W: Write> ResultSink for ConsoleSink<W> {
    type Output = ReportSummary;

    fn name(&self) -> &str {
        &self.name
    }

    fn render(&mut self, results: &[DispatchResult]) -> ReportSummary {
        let summary = ReportSummary::from_results(results);
        if let Err(e) = self.write_report(results, &summary) {
            warn!(sink = %self.name, error = %e, "failed to write report");
        }
        summary
    }
}

/// `OK   <path> (attempts=N)` or `FAIL <path>: <kind>: <message>`
fn format_line(result: &DispatchResult) -> String {
    let target = match result.path() {
        Some(path) => path.to_string(),
        None => result.address().to_string(),
    };
    match result.error() {
        None => format!("OK   {target} (attempts={})", result.attempts()),
        Some(err) => format!("FAIL {target}: {}: {err}", err.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DeviceAddress, DispatchError, RemoteError};

    fn addr(device: &str) -> DeviceAddress {
        DeviceAddress::new("p", "l", "r", device)
    }

    fn path(device: &str) -> String {
        format!("projects/p/locations/l/registries/r/devices/{device}")
    }

    #[test]
    fn test_console_report_lines() {
        let results = vec![
            DispatchResult::succeeded(addr("a"), path("a"), 1),
            DispatchResult::failed(
                addr("b"),
                Some(path("b")),
                DispatchError::Remote(RemoteError::NotFound("device not found".into())),
                1,
            ),
            DispatchResult::cancelled(addr("c")),
        ];

        let mut sink = ConsoleSink::new(Vec::new());
        let summary = sink.render(&results);
        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "OK   projects/p/locations/l/registries/r/devices/a (attempts=1)");
        assert!(lines[1].starts_with("FAIL projects/p/locations/l/registries/r/devices/b: not_found:"));
        assert!(lines[1].contains("device not found"));
        assert!(lines[2].starts_with("FAIL p/l/r/c: cancelled:"));
        assert_eq!(lines[3], "1 succeeded, 1 failed, 1 cancelled (3 total)");

        assert_eq!(
            summary,
            ReportSummary {
                total: 3,
                succeeded: 1,
                failed: 1,
                cancelled: 1
            }
        );
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_all_success() {
        let results = vec![DispatchResult::succeeded(addr("a"), path("a"), 2)];
        let summary = ConsoleSink::new(Vec::new()).render(&results);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_empty_batch_exit_code() {
        let summary = ConsoleSink::new(Vec::new()).render(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.exit_code(), 0);
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_errors_are_swallowed() {
        let results = vec![DispatchResult::cancelled(addr("a"))];
        let summary = ConsoleSink::new(BrokenWriter).render(&results);
        assert_eq!(summary.cancelled, 1);
    }
}
