//! Metrics collector - per-round derivation and cross-round aggregation

use std::time::Duration;

use hdrhistogram::Histogram;

use super::latency::LatencySummary;
use crate::config::RoundConfig;
use crate::engine::EngineKind;
use crate::workload::RoundState;

/// Units per second over `elapsed`; zero when nothing elapsed
pub fn throughput(units: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        units as f64 / secs
    } else {
        0.0
    }
}

/// CPU time as a percentage of one core over `elapsed` (may exceed 100)
pub fn cpu_usage_percent(cpu: Duration, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        cpu.as_secs_f64() / secs * 100.0
    } else {
        0.0
    }
}

/// Raw observations of one finished round
pub struct RoundSample<'a> {
    pub round: u32,
    pub expected_units: u64,
    pub state: RoundState,
    pub elapsed: Duration,
    pub cpu_time: Option<Duration>,
    pub latency: &'a Histogram<u64>,
}

/// Metrics of one measured round
#[derive(Debug, Clone)]
pub struct RoundMetrics {
    pub round: u32,
    /// Units dispatched, and therefore the required final counter
    pub expected_units: u64,
    pub final_counter: u64,
    pub final_junk: i64,
    pub last_seed: Option<i64>,
    pub elapsed: Duration,
    pub critical_time: Duration,
    /// Work units per second
    pub throughput: f64,
    /// `None` when the CPU clock could not be read
    pub cpu_usage_percent: Option<f64>,
    pub latency: LatencySummary,
}

impl RoundMetrics {
    /// Derive metrics from one round's observations
    pub fn from_sample(sample: RoundSample<'_>) -> Self {
        Self {
            round: sample.round,
            expected_units: sample.expected_units,
            final_counter: sample.state.counter,
            final_junk: sample.state.junk,
            last_seed: sample.state.last_seed,
            elapsed: sample.elapsed,
            critical_time: sample.state.critical_time,
            throughput: throughput(sample.expected_units, sample.elapsed),
            cpu_usage_percent: sample
                .cpu_time
                .map(|cpu| cpu_usage_percent(cpu, sample.elapsed)),
            latency: LatencySummary::from_histogram(sample.latency),
        }
    }

    /// Counter disagrees with the dispatched unit count
    pub fn has_race(&self) -> bool {
        self.final_counter != self.expected_units
    }

    /// Share of the round spent inside the critical section
    pub fn critical_ratio(&self) -> f64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed > 0.0 {
            self.critical_time.as_secs_f64() / elapsed
        } else {
            0.0
        }
    }

    /// Convert to JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "round": self.round,
            "expected_units": self.expected_units,
            "final_counter": self.final_counter,
            "final_junk": self.final_junk,
            "elapsed_secs": self.elapsed.as_secs_f64(),
            "critical_secs": self.critical_time.as_secs_f64(),
            "critical_ratio": self.critical_ratio(),
            "throughput": self.throughput,
            "cpu_usage_percent": self.cpu_usage_percent,
            "critical_latency": self.latency,
        })
    }
}

/// Accumulates round metrics for one run
pub struct MetricsCollector {
    engine: EngineKind,
    config: RoundConfig,
    rounds: Vec<RoundMetrics>,
}

impl MetricsCollector {
    /// Create new metrics collector
    pub fn new(engine: EngineKind, config: RoundConfig) -> Self {
        Self {
            engine,
            config,
            rounds: Vec::with_capacity(config.rounds as usize),
        }
    }

    /// Record a finished round
    pub fn record(&mut self, metrics: RoundMetrics) {
        self.rounds.push(metrics);
    }

    /// Aggregate all rounds. `available_parallelism` normalizes CPU usage.
    pub fn finish(self, available_parallelism: usize) -> BenchmarkResult {
        let count = self.rounds.len();
        let total_elapsed: Duration = self.rounds.iter().map(|r| r.elapsed).sum();
        let total_critical: Duration = self.rounds.iter().map(|r| r.critical_time).sum();
        let total_units: u64 = self.rounds.iter().map(|r| r.expected_units).sum();

        let (mean_elapsed, mean_critical_time) = if count > 0 {
            (total_elapsed / count as u32, total_critical / count as u32)
        } else {
            (Duration::ZERO, Duration::ZERO)
        };

        let cpu_samples: Vec<f64> = self
            .rounds
            .iter()
            .filter_map(|r| r.cpu_usage_percent)
            .collect();
        let mean_cpu_usage_percent = if cpu_samples.is_empty() {
            None
        } else {
            Some(cpu_samples.iter().sum::<f64>() / cpu_samples.len() as f64)
        };
        let parallelism = available_parallelism.max(1);
        let normalized_cpu_usage_percent =
            mean_cpu_usage_percent.map(|mean| mean / parallelism as f64);

        let race_condition = self.rounds.iter().any(RoundMetrics::has_race);

        BenchmarkResult {
            engine: self.engine,
            config: self.config,
            global_throughput: throughput(total_units, total_elapsed),
            rounds: self.rounds,
            mean_elapsed,
            mean_critical_time,
            mean_cpu_usage_percent,
            normalized_cpu_usage_percent,
            race_condition,
            available_parallelism: parallelism,
        }
    }
}

/// Result of a full benchmark run
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub engine: EngineKind,
    pub config: RoundConfig,
    pub rounds: Vec<RoundMetrics>,
    pub mean_elapsed: Duration,
    pub mean_critical_time: Duration,
    /// Units across all rounds over total elapsed time
    pub global_throughput: f64,
    pub mean_cpu_usage_percent: Option<f64>,
    /// Mean CPU usage divided by available parallelism
    pub normalized_cpu_usage_percent: Option<f64>,
    /// Some round ended with a counter different from its unit count
    pub race_condition: bool,
    pub available_parallelism: usize,
}

impl BenchmarkResult {
    /// Final counter of every round, in order
    pub fn counters(&self) -> Vec<u64> {
        self.rounds.iter().map(|r| r.final_counter).collect()
    }

    pub fn total_units(&self) -> u64 {
        self.rounds.iter().map(|r| r.expected_units).sum()
    }

    /// Junk value left by the last round
    pub fn final_junk(&self) -> Option<i64> {
        self.rounds.last().map(|r| r.final_junk)
    }

    /// Convert to JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "engine": self.engine,
            "config": self.config,
            "summary": {
                "race_condition": self.race_condition,
                "mean_elapsed_secs": self.mean_elapsed.as_secs_f64(),
                "mean_critical_secs": self.mean_critical_time.as_secs_f64(),
                "global_throughput": self.global_throughput,
                "mean_cpu_usage_percent": self.mean_cpu_usage_percent,
                "normalized_cpu_usage_percent": self.normalized_cpu_usage_percent,
                "available_parallelism": self.available_parallelism,
                "final_junk": self.final_junk(),
            },
            "rounds": self.rounds.iter().map(RoundMetrics::to_json).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::latency::new_latency_histogram;

    fn metrics(round: u32, counter: u64, elapsed_ms: u64, cpu_ms: Option<u64>) -> RoundMetrics {
        let histogram = new_latency_histogram();
        let state = RoundState {
            counter,
            junk: 7,
            last_seed: Some(1),
            critical_time: Duration::from_millis(elapsed_ms / 2),
        };
        RoundMetrics::from_sample(RoundSample {
            round,
            expected_units: 100,
            state,
            elapsed: Duration::from_millis(elapsed_ms),
            cpu_time: cpu_ms.map(Duration::from_millis),
            latency: &histogram,
        })
    }

    #[test]
    fn test_round_derivation() {
        let m = metrics(0, 100, 500, Some(1000));
        assert!((m.throughput - 200.0).abs() < 1e-9);
        assert!((m.cpu_usage_percent.unwrap() - 200.0).abs() < 1e-9);
        assert!((m.critical_ratio() - 0.5).abs() < 1e-9);
        assert_eq!(m.to_json()["critical_ratio"].as_f64(), Some(0.5));
        assert!(!m.has_race());
    }

    #[test]
    fn test_zero_elapsed() {
        assert_eq!(throughput(10, Duration::ZERO), 0.0);
        assert_eq!(cpu_usage_percent(Duration::from_secs(1), Duration::ZERO), 0.0);
    }

    #[test]
    fn test_aggregation() {
        let config = RoundConfig::single_shot(100, 10, 2);
        let mut collector = MetricsCollector::new(EngineKind::Mutex, config);
        collector.record(metrics(0, 100, 1000, Some(500)));
        collector.record(metrics(1, 100, 3000, Some(4500)));

        let result = collector.finish(4);
        assert_eq!(result.rounds.len(), 2);
        assert_eq!(result.mean_elapsed, Duration::from_secs(2));
        assert_eq!(result.mean_critical_time, Duration::from_secs(1));
        // 200 units over 4 seconds
        assert!((result.global_throughput - 50.0).abs() < 1e-9);
        // (50% + 150%) / 2
        assert!((result.mean_cpu_usage_percent.unwrap() - 100.0).abs() < 1e-9);
        assert!((result.normalized_cpu_usage_percent.unwrap() - 25.0).abs() < 1e-9);
        assert!(!result.race_condition);
        assert_eq!(result.counters(), vec![100, 100]);
        assert_eq!(result.total_units(), 200);
    }

    #[test]
    fn test_race_flag() {
        let config = RoundConfig::single_shot(100, 10, 3);
        let mut collector = MetricsCollector::new(EngineKind::Sequencer, config);
        collector.record(metrics(0, 100, 10, None));
        collector.record(metrics(1, 99, 10, None));
        collector.record(metrics(2, 100, 10, None));

        let result = collector.finish(8);
        assert!(result.race_condition);
        assert!(result.rounds[1].has_race());
    }

    #[test]
    fn test_cpu_unavailable() {
        let config = RoundConfig::single_shot(100, 10, 2);
        let mut collector = MetricsCollector::new(EngineKind::Sequencer, config);
        collector.record(metrics(0, 100, 10, None));
        collector.record(metrics(1, 100, 10, Some(10)));

        let result = collector.finish(2);
        // Only the round with a CPU sample contributes
        assert!((result.mean_cpu_usage_percent.unwrap() - 100.0).abs() < 1e-9);

        let config = RoundConfig::single_shot(100, 10, 1);
        let mut collector = MetricsCollector::new(EngineKind::Sequencer, config);
        collector.record(metrics(0, 100, 10, None));
        let result = collector.finish(2);
        assert!(result.mean_cpu_usage_percent.is_none());
        assert!(result.normalized_cpu_usage_percent.is_none());
    }

    #[test]
    fn test_json_shape() {
        let config = RoundConfig::looped(10, 10, 1, 1);
        let mut collector = MetricsCollector::new(EngineKind::Mutex, config);
        collector.record(metrics(0, 100, 10, None));
        let json = collector.finish(1).to_json();

        assert_eq!(json["engine"], "mutex");
        assert_eq!(json["config"]["increments_per_worker"], 10);
        assert_eq!(json["summary"]["race_condition"], false);
        assert_eq!(json["rounds"][0]["final_counter"], 100);
        assert!(json["rounds"][0]["cpu_usage_percent"].is_null());
    }
}
