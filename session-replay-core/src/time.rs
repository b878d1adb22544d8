//! Time sources for the capture pipeline
//!
//! Two clocks are involved: a monotonic device clock used to decide item
//! expiry, and a wall clock used to timestamp records.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

/// Source of device time
pub trait TimeProvider: Send + Sync {
    /// Monotonic device time in nanoseconds
    fn elapsed_time_ns(&self) -> u64;

    /// Wall clock time in milliseconds since the Unix epoch
    fn timestamp_ms(&self) -> i64;
}

/// Time provider backed by the system clocks
#[derive(Debug, Clone)]
pub struct SystemTimeProvider {
    origin: Instant,
}

impl SystemTimeProvider {
    /// Create a provider whose monotonic clock starts now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn elapsed_time_ns(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn timestamp_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualTimeProvider {
    elapsed_ns: AtomicU64,
    timestamp_ms: AtomicI64,
}

impl ManualTimeProvider {
    /// Create a clock frozen at the given device time
    pub fn new(elapsed_ns: u64) -> Self {
        Self {
            elapsed_ns: AtomicU64::new(elapsed_ns),
            timestamp_ms: AtomicI64::new(0),
        }
    }

    /// Set the device time
    pub fn set_elapsed_ns(&self, elapsed_ns: u64) {
        self.elapsed_ns.store(elapsed_ns, Ordering::SeqCst);
    }

    /// Move both clocks forward
    pub fn advance_ns(&self, delta_ns: u64) {
        self.elapsed_ns.fetch_add(delta_ns, Ordering::SeqCst);
        let delta_ms = i64::try_from(delta_ns / 1_000_000).unwrap_or(i64::MAX);
        self.timestamp_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Set the wall clock
    pub fn set_timestamp_ms(&self, timestamp_ms: i64) {
        self.timestamp_ms.store(timestamp_ms, Ordering::SeqCst);
    }
}

impl TimeProvider for ManualTimeProvider {
    fn elapsed_time_ns(&self) -> u64 {
        self.elapsed_ns.load(Ordering::SeqCst)
    }

    fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms.load(Ordering::SeqCst)
    }
}
