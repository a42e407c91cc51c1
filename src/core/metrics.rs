//! Relay metrics for observability
//!
//! Counters for queue throughput, overflow drops and sink failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for relay observability
///
/// # Example
///
/// ```
/// use log_relay::RelayMetrics;
///
/// let metrics = RelayMetrics::new();
/// metrics.record_enqueued();
/// metrics.record_dispatched();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.pending(), 0);
/// ```
#[derive(Debug)]
pub struct RelayMetrics {
    /// Records pushed by producers, including ones later dropped
    enqueued: AtomicU64,

    /// Records popped and dispatched by the worker
    dispatched: AtomicU64,

    /// Records lost to a bounded queue's overflow policy
    dropped: AtomicU64,

    /// Sink or exception-handler invocations that failed
    sink_failures: AtomicU64,

    /// Error records whose trace was withheld by the exception policy
    traces_suppressed: AtomicU64,
}

impl RelayMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            traces_suppressed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn traces_suppressed(&self) -> u64 {
        self.traces_suppressed.load(Ordering::Relaxed)
    }

    /// Records pushed but not yet dispatched or dropped
    pub fn pending(&self) -> u64 {
        self.enqueued()
            .saturating_sub(self.dispatched())
            .saturating_sub(self.dropped())
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a dropped record, returning the previous drop count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_trace_suppressed(&self) -> u64 {
        self.traces_suppressed.fetch_add(1, Ordering::Relaxed)
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.dispatched.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.traces_suppressed.store(0, Ordering::Relaxed);
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RelayMetrics {
    /// Create a snapshot of the current counter values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            dispatched: AtomicU64::new(self.dispatched()),
            dropped: AtomicU64::new(self.dropped()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            traces_suppressed: AtomicU64::new(self.traces_suppressed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = RelayMetrics::new();
        assert_eq!(metrics.enqueued(), 0);
        assert_eq!(metrics.dispatched(), 0);
        assert_eq!(metrics.dropped(), 0);
        assert_eq!(metrics.sink_failures(), 0);
        assert_eq!(metrics.traces_suppressed(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = RelayMetrics::new();
        assert_eq!(metrics.record_dropped(), 0);
        assert_eq!(metrics.record_dropped(), 1);
        assert_eq!(metrics.dropped(), 2);
    }

    #[test]
    fn test_pending() {
        let metrics = RelayMetrics::new();
        for _ in 0..10 {
            metrics.record_enqueued();
        }
        for _ in 0..6 {
            metrics.record_dispatched();
        }
        metrics.record_dropped();
        assert_eq!(metrics.pending(), 3);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let metrics = RelayMetrics::new();
        metrics.record_enqueued();

        let snapshot = metrics.clone();
        metrics.record_enqueued();

        assert_eq!(snapshot.enqueued(), 1);
        assert_eq!(metrics.enqueued(), 2);

        metrics.reset();
        assert_eq!(metrics.enqueued(), 0);
    }
}
