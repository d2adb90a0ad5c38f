//! ResultSink trait - presentation boundary for dispatch outcomes

use crate::DispatchResult;

/// Renders dispatch results to the calling context
///
/// Must never fail and must account for every input result; sinks swallow
/// (and log) their own IO problems.
pub trait ResultSink {
    /// What the caller gets back (exit summary, HTTP response, ...)
    type Output;

    /// Sink name (used for logging)
    fn name(&self) -> &str;

    fn render(&mut self, results: &[DispatchResult]) -> Self::Output;
}
