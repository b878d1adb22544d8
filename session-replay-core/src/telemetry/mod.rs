//! Drop reporting: sampled telemetry logs and queue counters

mod metrics;
mod sampling;

pub use metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use sampling::{SamplingPolicy, TelemetrySampler};

/// `tracing` target for events meant for SDK telemetry
pub const TELEMETRY_TARGET: &str = "session_replay::telemetry";
