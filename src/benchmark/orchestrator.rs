//! Benchmark orchestrator
//!
//! Drives the warm-up and then every measured round, strictly one after
//! another, and collects results.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use super::round::RoundRunner;
use super::warmup::WarmupController;
use crate::config::BenchmarkConfig;
use crate::metrics::{
    cpu_time_between, BenchmarkResult, CpuClock, MetricsCollector, ProcessCpuClock, RoundMetrics,
    RoundSample,
};
use crate::utils::Result;

/// Benchmark orchestrator
pub struct Orchestrator<C: CpuClock = ProcessCpuClock> {
    config: Arc<BenchmarkConfig>,
    clock: C,
    /// Execution units available to the process, for CPU normalization
    parallelism: usize,
}

impl Orchestrator<ProcessCpuClock> {
    /// Create new orchestrator sampling this process's CPU time
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        Self::with_clock(config, ProcessCpuClock::new())
    }
}

impl<C: CpuClock> Orchestrator<C> {
    /// Create orchestrator with an explicit CPU-time source.
    ///
    /// Fails on invalid configuration, before anything runs.
    pub fn with_clock(config: BenchmarkConfig, clock: C) -> Result<Self> {
        config.validate()?;

        let parallelism = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1);

        Ok(Self {
            config: Arc::new(config),
            clock,
            parallelism,
        })
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    fn measured_runner(&self) -> RoundRunner {
        RoundRunner::new(
            self.config.engine,
            &self.config.round,
            self.config.producer_stack_size,
            self.config.deadline,
        )
    }

    /// Run the discarded warm-up round
    pub fn warmup(&self) -> Result<()> {
        WarmupController::new(
            self.config.engine,
            &self.config.warmup,
            self.config.producer_stack_size,
            self.config.deadline,
        )
        .run()
    }

    /// Run and measure one round
    pub fn run_round(&self, round: u32) -> Result<RoundMetrics> {
        let runner = self.measured_runner();

        let cpu_start = self.clock.sample();
        let start = Instant::now();

        let outcome = runner.run()?;

        let elapsed = start.elapsed();
        let cpu_end = self.clock.sample();

        let cpu_time = cpu_time_between(cpu_start, cpu_end);
        if cpu_time.is_none() {
            warn!(round, "CPU time unavailable, recording usage as n/a");
        }

        let metrics = RoundMetrics::from_sample(RoundSample {
            round,
            expected_units: runner.expected_units(),
            state: outcome.state,
            elapsed,
            cpu_time,
            latency: &outcome.latency,
        });

        debug!(
            round,
            counter = metrics.final_counter,
            elapsed_ms = metrics.elapsed.as_secs_f64() * 1000.0,
            critical_ms = metrics.critical_time.as_secs_f64() * 1000.0,
            throughput = metrics.throughput,
            "round complete"
        );
        if metrics.has_race() {
            warn!(
                round,
                counter = metrics.final_counter,
                expected = metrics.expected_units,
                "counter mismatch"
            );
        }

        Ok(metrics)
    }

    /// Warm up once, then run every configured round
    pub fn run_all(&self) -> Result<BenchmarkResult> {
        let engine = self.config.engine;
        let round_config = self.config.round;

        info!(
            engine = %engine,
            workers = self.config.warmup.workers,
            intensity = self.config.warmup.loop_intensity,
            "warming up"
        );
        self.warmup()?;

        info!(
            engine = %engine,
            variant = round_config.variant_name(),
            workers = round_config.workers,
            units = round_config.expected_units(),
            intensity = round_config.loop_intensity,
            rounds = round_config.rounds,
            "starting benchmark"
        );

        let pb = self.progress_bar(round_config.rounds as u64);
        let mut collector = MetricsCollector::new(engine, round_config);

        for round in 0..round_config.rounds {
            let metrics = self.run_round(round)?;
            pb.set_message(format!(
                "{} ops/s",
                crate::metrics::format_throughput(metrics.throughput)
            ));
            collector.record(metrics);
            pb.inc(1);
        }
        pb.finish_with_message("done");

        let result = collector.finish(self.parallelism);
        info!(
            race_condition = result.race_condition,
            global_throughput = result.global_throughput,
            "benchmark complete"
        );
        Ok(result)
    }

    fn progress_bar(&self, rounds: u64) -> ProgressBar {
        if self.config.quiet {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(rounds);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rounds ({msg})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}
