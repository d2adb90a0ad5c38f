//! Engine metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::DispatchResult;

/// In-process counters shared by every worker of one engine
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Remote calls made
    attempts: AtomicU64,
    /// Remote calls that were retries (attempt >= 2)
    retries: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

impl EngineMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one remote call
    pub fn inc_attempt(&self, attempt: u32) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if attempt > 1 {
            self.retries.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count a final result
    pub fn record_result(&self, result: &DispatchResult) {
        let counter = if result.success() {
            &self.succeeded
        } else if result.is_cancelled() {
            &self.cancelled
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts(),
            retries: self.retries(),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of engine metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub retries: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl MetricsSnapshot {
    /// Results recorded so far
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed + self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DeviceAddress, DispatchError};

    #[test]
    fn test_snapshot_counts() {
        let metrics = EngineMetrics::new();
        let addr = DeviceAddress::new("p", "l", "r", "d");

        metrics.inc_attempt(1);
        metrics.inc_attempt(2);
        metrics.record_result(&DispatchResult::succeeded(addr.clone(), "x".into(), 2));
        metrics.record_result(&DispatchResult::cancelled(addr.clone()));
        metrics.record_result(&DispatchResult::failed(
            addr,
            None,
            DispatchError::Internal("boom".into()),
            0,
        ));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.attempts, 2);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.cancelled, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.completed(), 3);
    }
}
