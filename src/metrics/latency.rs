//! Critical-section latency histograms

use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

/// Highest trackable critical-section duration (60s, in nanoseconds)
const MAX_TRACKABLE_NS: u64 = 60_000_000_000;

/// Create an empty nanosecond-resolution latency histogram
pub fn new_latency_histogram() -> Histogram<u64> {
    Histogram::new_with_bounds(1, MAX_TRACKABLE_NS, 3).expect("Failed to create histogram")
}

/// Record one critical-section duration, clamping to the trackable range
#[inline]
pub fn record_duration(histogram: &mut Histogram<u64>, duration: Duration) {
    histogram.saturating_record(duration.as_nanos().min(u64::MAX as u128) as u64);
}

/// Percentile summary of one round's critical-section executions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub mean_ns: f64,
    pub p50_ns: u64,
    pub p99_ns: u64,
    pub max_ns: u64,
}

impl LatencySummary {
    pub fn from_histogram(histogram: &Histogram<u64>) -> Self {
        if histogram.is_empty() {
            return Self::default();
        }
        Self {
            samples: histogram.len(),
            mean_ns: histogram.mean(),
            p50_ns: histogram.value_at_quantile(0.50),
            p99_ns: histogram.value_at_quantile(0.99),
            max_ns: histogram.max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let histogram = new_latency_histogram();
        assert_eq!(LatencySummary::from_histogram(&histogram), LatencySummary::default());
    }

    #[test]
    fn test_summary_percentiles() {
        let mut histogram = new_latency_histogram();
        for _ in 0..99 {
            record_duration(&mut histogram, Duration::from_nanos(1_000));
        }
        record_duration(&mut histogram, Duration::from_micros(500));

        let summary = LatencySummary::from_histogram(&histogram);
        assert_eq!(summary.samples, 100);
        assert!(summary.p50_ns >= 990 && summary.p50_ns <= 1_010);
        assert!(summary.max_ns >= 499_000);
    }

    #[test]
    fn test_record_clamps_huge_values() {
        let mut histogram = new_latency_histogram();
        record_duration(&mut histogram, Duration::from_secs(3600));
        assert_eq!(histogram.len(), 1);
    }
}
