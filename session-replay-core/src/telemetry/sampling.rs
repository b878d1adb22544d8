//! Sampling of drop reports sent to telemetry

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// How often a drop report reaches the telemetry target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingPolicy {
    /// Every report
    Always,
    /// No report; drops are still logged at debug level
    Never,
    /// `percent` out of every hundred reports
    Percent(u32),
}

impl SamplingPolicy {
    /// Policy for a 0-100 sample rate; anything above 100 reports everything
    pub fn from_rate(rate: u32) -> Self {
        match rate {
            0 => SamplingPolicy::Never,
            r if r >= 100 => SamplingPolicy::Always,
            r => SamplingPolicy::Percent(r),
        }
    }
}

impl fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingPolicy::Always => f.write_str("always"),
            SamplingPolicy::Never => f.write_str("never"),
            SamplingPolicy::Percent(rate) => write!(f, "{}%", rate),
        }
    }
}

/// Gate deciding which drop events are reported as telemetry.
///
/// Percent sampling is deterministic: a shared counter walks through each
/// block of one hundred reports and lets the first `percent` of them through,
/// so concurrent drain passes still report the configured share.
#[derive(Debug)]
pub struct TelemetrySampler {
    policy: SamplingPolicy,
    reports: AtomicU64,
}

impl TelemetrySampler {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self {
            policy,
            reports: AtomicU64::new(0),
        }
    }

    pub fn from_rate(rate: u32) -> Self {
        Self::new(SamplingPolicy::from_rate(rate))
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Whether the next drop report goes to telemetry
    pub fn sample(&self) -> bool {
        match self.policy {
            SamplingPolicy::Always => true,
            SamplingPolicy::Never => false,
            SamplingPolicy::Percent(rate) => {
                let seen = self.reports.fetch_add(1, Ordering::Relaxed);
                seen % 100 < u64::from(rate)
            }
        }
    }
}

impl Default for TelemetrySampler {
    fn default() -> Self {
        Self::new(SamplingPolicy::Always)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_and_never() {
        let always = TelemetrySampler::from_rate(100);
        let never = TelemetrySampler::from_rate(0);

        for _ in 0..100 {
            assert!(always.sample());
            assert!(!never.sample());
        }
    }

    #[test]
    fn test_percent_reports_exact_share() {
        let sampler = TelemetrySampler::from_rate(25);

        let reported = (0..1000).filter(|_| sampler.sample()).count();

        assert_eq!(reported, 250);
    }

    #[test]
    fn test_policy_from_rate() {
        assert_eq!(SamplingPolicy::from_rate(0), SamplingPolicy::Never);
        assert_eq!(SamplingPolicy::from_rate(40), SamplingPolicy::Percent(40));
        assert_eq!(SamplingPolicy::from_rate(500), SamplingPolicy::Always);
        assert_eq!(TelemetrySampler::default().policy().to_string(), "always");
        assert_eq!(SamplingPolicy::Percent(15).to_string(), "15%");
    }
}
