//! Dispatch metrics
//!
//! Every record that passes sampling ends in exactly one [`DispatchOutcome`].
//! Queue pressure is tracked on the side: how often the async queue was full
//! and how many error records were written inline because of it.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Final fate of a dispatched record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Accepted by every sink
    Delivered,
    /// At least one sink returned an error or panicked
    SinkFailed,
    /// Discarded because the async queue was full
    QueueDropped,
}

/// Live counters shared by a logger family
///
/// # Example
///
/// ```
/// use structured_log_pipeline::core::metrics::{DispatchOutcome, LoggerMetrics};
///
/// let metrics = LoggerMetrics::new();
/// metrics.record(DispatchOutcome::Delivered);
/// metrics.record(DispatchOutcome::SinkFailed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.dispatched(), 2);
/// assert_eq!(snapshot.loss_ratio(), 0.5);
/// ```
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    delivered: AtomicU64,
    sink_failures: AtomicU64,
    queue_dropped: AtomicU64,
    queue_full_events: AtomicU64,
    errors_forced: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            delivered: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            queue_dropped: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            errors_forced: AtomicU64::new(0),
        }
    }

    fn counter(&self, outcome: DispatchOutcome) -> &AtomicU64 {
        match outcome {
            DispatchOutcome::Delivered => &self.delivered,
            DispatchOutcome::SinkFailed => &self.sink_failures,
            DispatchOutcome::QueueDropped => &self.queue_dropped,
        }
    }

    /// Count one outcome, returning that outcome's new total
    #[inline]
    pub fn record(&self, outcome: DispatchOutcome) -> u64 {
        self.counter(outcome).fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The async queue rejected a record; `forced` when it was written inline
    pub fn record_queue_full(&self, forced: bool) {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed);
        if forced {
            self.errors_forced.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn count(&self, outcome: DispatchOutcome) -> u64 {
        self.counter(outcome).load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.count(DispatchOutcome::Delivered)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.count(DispatchOutcome::SinkFailed)
    }

    #[inline]
    pub fn queue_dropped(&self) -> u64 {
        self.count(DispatchOutcome::QueueDropped)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            delivered: self.delivered(),
            sink_failures: self.sink_failures(),
            queue_dropped: self.queue_dropped(),
            queue_full_events: self.queue_full_events.load(Ordering::Relaxed),
            errors_forced: self.errors_forced.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`LoggerMetrics`], serializable for health endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub delivered: u64,
    pub sink_failures: u64,
    pub queue_dropped: u64,
    pub queue_full_events: u64,
    pub errors_forced: u64,
}

impl MetricsSnapshot {
    /// Records that reached the dispatcher, whatever their fate
    pub fn dispatched(&self) -> u64 {
        self.delivered + self.sink_failures + self.queue_dropped
    }

    pub fn lost(&self) -> u64 {
        self.sink_failures + self.queue_dropped
    }

    /// Share of dispatched records not fully delivered, in `[0, 1]`
    pub fn loss_ratio(&self) -> f64 {
        match self.dispatched() {
            0 => 0.0,
            total => self.lost() as f64 / total as f64,
        }
    }
}
