//! Queue counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`QueueMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMetricsSnapshot {
    /// Items accepted into the queue
    pub enqueued: u64,
    /// Items handed to the executor
    pub emitted: u64,
    /// Items dropped for exceeding the maximum delay
    pub dropped_expired: u64,
    /// Items dropped for failing validation
    pub dropped_invalid: u64,
    /// Ready items refused by a stopped executor
    pub rejected: u64,
    /// Items discarded by clear-and-stop
    pub cleared: u64,
    /// Processor calls that returned an error
    pub processor_failures: u64,
}

impl QueueMetricsSnapshot {
    /// Items that left the queue without reaching the processor
    pub fn lost(&self) -> u64 {
        self.dropped_expired + self.dropped_invalid + self.rejected + self.cleared
    }
}

/// Lock-free counters updated by the queue handler and its worker
#[derive(Debug, Default)]
pub struct QueueMetrics {
    enqueued: AtomicU64,
    emitted: AtomicU64,
    dropped_expired: AtomicU64,
    dropped_invalid: AtomicU64,
    rejected: AtomicU64,
    cleared: AtomicU64,
    processor_failures: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_expired(&self) {
        self.dropped_expired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_invalid(&self) {
        self.dropped_invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cleared(&self, count: u64) {
        self.cleared.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_processor_failure(&self) {
        self.processor_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            dropped_expired: self.dropped_expired.load(Ordering::Relaxed),
            dropped_invalid: self.dropped_invalid.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            cleared: self.cleared.load(Ordering::Relaxed),
            processor_failures: self.processor_failures.load(Ordering::Relaxed),
        }
    }
}
