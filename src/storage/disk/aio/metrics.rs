//! Counters for queue observability. Purely observational: nothing in the
//! submission path gates on these values.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters for a single [`AioQueue`](super::AioQueue).
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Requests accepted into the waiting set.
    enqueued: AtomicU64,
    /// Requests handed to the OS.
    submitted: AtomicU64,
    /// Requests removed from the posted set by the completion path.
    completed: AtomicU64,
    /// Requests cancelled before ever reaching the OS.
    cancelled_waiting: AtomicU64,
    /// Cancellation attempts that lost the race against completion.
    cancellation_races: AtomicU64,
    /// Times the worker stalled on a saturated OS submission queue.
    backpressure_stalls: AtomicU64,
    /// Submissions the OS rejected for a reason other than queue depth.
    submit_failures: AtomicU64,
}

impl QueueMetrics {
    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled_waiting(&self) {
        self.cancelled_waiting.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancellation_race(&self) {
        self.cancellation_races.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_backpressure_stall(&self) {
        self.backpressure_stalls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_submit_failure(&self) {
        self.submit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            cancelled_waiting: self.cancelled_waiting.load(Ordering::Relaxed),
            cancellation_races: self.cancellation_races.load(Ordering::Relaxed),
            backpressure_stalls: self.backpressure_stalls.load(Ordering::Relaxed),
            submit_failures: self.submit_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`QueueMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueMetricsSnapshot {
    pub enqueued: u64,
    pub submitted: u64,
    pub completed: u64,
    pub cancelled_waiting: u64,
    pub cancellation_races: u64,
    pub backpressure_stalls: u64,
    pub submit_failures: u64,
}
