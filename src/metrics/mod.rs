//! Metrics collection and reporting
//!
//! This module provides:
//! - Process CPU-time sampling
//! - Critical-section latency histograms
//! - Per-round metrics and cross-round aggregation
//! - Console/JSON/CSV output

pub mod collector;
pub mod cpu_clock;
pub mod latency;
pub mod reporter;

pub use collector::{BenchmarkResult, MetricsCollector, RoundMetrics, RoundSample};
pub use cpu_clock::{cpu_time_between, CpuClock, ProcessCpuClock};
pub use latency::{new_latency_histogram, LatencySummary};
pub use reporter::{format_count, format_throughput, MetricsReporter};
