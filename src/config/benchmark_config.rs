//! Benchmark configuration derived from CLI arguments

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::cli::{CliArgs, OutputFormat};
use crate::engine::EngineKind;
use crate::utils::{BenchmarkError, Result};

/// Default per-round deadline
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(3600);

/// Default producer thread stack size
pub const DEFAULT_PRODUCER_STACK: usize = 64 * 1024;

/// Threads a round needs besides its producers: main and the sequencer
const SUPPORT_THREADS: u64 = 2;

/// Per-user thread limit (`RLIMIT_NPROC`); `None` when unlimited or unknown
#[cfg(any(target_os = "linux", target_os = "android", target_os = "macos", target_os = "freebsd"))]
pub fn thread_limit() -> Option<u64> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: getrlimit writes into the struct we own and touches nothing else.
    let ret = unsafe { libc::getrlimit(libc::RLIMIT_NPROC, &mut limit) };
    if ret != 0 || limit.rlim_cur == libc::RLIM_INFINITY {
        return None;
    }
    Some(limit.rlim_cur as u64)
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "macos", target_os = "freebsd")))]
pub fn thread_limit() -> Option<u64> {
    None
}

/// Producers are OS threads and all of them can be alive at once
fn check_thread_budget(what: &str, workers: u32, limit: Option<u64>) -> Result<()> {
    match limit {
        Some(limit) if workers as u64 + SUPPORT_THREADS > limit => Err(BenchmarkError::Config(format!(
            "{} workers need {} threads, above the process thread limit of {}",
            what,
            workers as u64 + SUPPORT_THREADS,
            limit
        ))),
        _ => Ok(()),
    }
}

/// Shape of one measured run; immutable once the run starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundConfig {
    /// Producer threads per round
    pub workers: u32,
    /// Workload iterations per critical section
    pub loop_intensity: u32,
    /// `None`: each producer admits one unit. `Some(n)`: each admits `n`.
    pub increments_per_worker: Option<u32>,
    /// Measured rounds
    pub rounds: u32,
}

impl RoundConfig {
    /// One work unit per producer
    pub fn single_shot(workers: u32, loop_intensity: u32, rounds: u32) -> Self {
        Self {
            workers,
            loop_intensity,
            increments_per_worker: None,
            rounds,
        }
    }

    /// `increments` work units per producer
    pub fn looped(workers: u32, increments: u32, loop_intensity: u32, rounds: u32) -> Self {
        Self {
            workers,
            loop_intensity,
            increments_per_worker: Some(increments),
            rounds,
        }
    }

    /// Every count must be positive
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(BenchmarkError::Config("worker count must be at least 1".into()));
        }
        if self.loop_intensity == 0 {
            return Err(BenchmarkError::Config("loop intensity must be at least 1".into()));
        }
        if self.increments_per_worker == Some(0) {
            return Err(BenchmarkError::Config(
                "increments per worker must be at least 1".into(),
            ));
        }
        if self.rounds == 0 {
            return Err(BenchmarkError::Config("round count must be at least 1".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn units_per_worker(&self) -> u64 {
        self.increments_per_worker.unwrap_or(1) as u64
    }

    /// Work units dispatched (and the counter value required) per round
    #[inline]
    pub fn expected_units(&self) -> u64 {
        self.workers as u64 * self.units_per_worker()
    }

    pub fn variant_name(&self) -> &'static str {
        if self.increments_per_worker.is_some() {
            "loop"
        } else {
            "single-shot"
        }
    }
}

/// Parameters of the discarded warm-up round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WarmupConfig {
    pub workers: u32,
    pub loop_intensity: u32,
    pub increments_per_worker: Option<u32>,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            workers: 100,
            loop_intensity: 10,
            increments_per_worker: None,
        }
    }
}

impl WarmupConfig {
    /// The warm-up as a one-round `RoundConfig`
    pub fn as_round(&self) -> RoundConfig {
        RoundConfig {
            workers: self.workers,
            loop_intensity: self.loop_intensity,
            increments_per_worker: self.increments_per_worker,
            rounds: 1,
        }
    }
}

/// Complete benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    // Engine
    pub engine: EngineKind,

    // Workload
    pub round: RoundConfig,
    pub warmup: WarmupConfig,

    // Timing
    pub deadline: Duration,
    pub producer_stack_size: usize,

    // Output
    pub output_path: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub csv_output: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}

impl BenchmarkConfig {
    /// Configuration with default warm-up, timing and output settings
    pub fn new(engine: EngineKind, round: RoundConfig) -> Self {
        Self {
            engine,
            round,
            warmup: WarmupConfig::default(),
            deadline: DEFAULT_DEADLINE,
            producer_stack_size: DEFAULT_PRODUCER_STACK,
            output_path: None,
            output_format: OutputFormat::Text,
            csv_output: None,
            quiet: false,
            verbose: false,
        }
    }

    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> std::result::Result<Self, String> {
        // Validate first
        args.validate()?;

        let round = RoundConfig {
            workers: args.workers,
            loop_intensity: args.intensity,
            increments_per_worker: args.increments,
            rounds: args.rounds,
        };

        let warmup = WarmupConfig {
            workers: args.warmup_workers,
            loop_intensity: args.warmup_intensity,
            increments_per_worker: args.warmup_increments,
        };

        let producer_stack_size = args
            .stack_kb
            .checked_mul(1024)
            .ok_or_else(|| format!("--stack-kb {} is too large", args.stack_kb))?;

        Ok(Self {
            engine: args.engine,
            round,
            warmup,
            deadline: Duration::from_secs(args.deadline_secs),
            producer_stack_size,
            output_path: args.output.clone(),
            output_format: args.output_format,
            csv_output: args.csv_output.clone(),
            quiet: args.quiet,
            verbose: args.verbose,
        })
    }

    /// Validate everything the run depends on
    pub fn validate(&self) -> Result<()> {
        self.round.validate()?;
        self.warmup
            .as_round()
            .validate()
            .map_err(|e| BenchmarkError::Config(format!("warm-up: {}", e)))?;
        if self.deadline.is_zero() {
            return Err(BenchmarkError::Config("deadline must be positive".into()));
        }
        let limit = thread_limit();
        check_thread_budget("measured", self.round.workers, limit)?;
        check_thread_budget("warm-up", self.warmup.workers, limit)?;
        Ok(())
    }

    /// Builder-style quiet toggle
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_expected_units() {
        assert_eq!(RoundConfig::single_shot(100, 10, 5).expected_units(), 100);
        assert_eq!(RoundConfig::looped(50, 20, 1, 5).expected_units(), 1000);
        assert_eq!(RoundConfig::single_shot(100, 10, 5).variant_name(), "single-shot");
        assert_eq!(RoundConfig::looped(50, 20, 1, 5).variant_name(), "loop");
    }

    #[test]
    fn test_round_validation() {
        assert!(RoundConfig::single_shot(1, 1, 1).validate().is_ok());
        assert!(RoundConfig::single_shot(0, 1, 1).validate().is_err());
        assert!(RoundConfig::single_shot(1, 0, 1).validate().is_err());
        assert!(RoundConfig::single_shot(1, 1, 0).validate().is_err());
        assert!(RoundConfig::looped(1, 0, 1, 1).validate().is_err());
    }

    #[test]
    fn test_from_cli() {
        let args = CliArgs::parse_from([
            "test",
            "-e",
            "mutex",
            "-w",
            "8",
            "-n",
            "4",
            "--deadline-secs",
            "30",
            "--stack-kb",
            "128",
        ]);
        let config = BenchmarkConfig::from_cli(&args).unwrap();
        assert_eq!(config.engine, EngineKind::Mutex);
        assert_eq!(config.round.expected_units(), 32);
        assert_eq!(config.deadline, Duration::from_secs(30));
        assert_eq!(config.producer_stack_size, 128 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_cli_rejects_invalid() {
        let args = CliArgs::parse_from(["test", "-r", "0"]);
        assert!(BenchmarkConfig::from_cli(&args).is_err());
    }

    #[test]
    fn test_from_cli_rejects_overflowing_stack() {
        let huge = usize::MAX.to_string();
        let args = CliArgs::parse_from(["test", "--stack-kb", huge.as_str()]);
        assert!(BenchmarkConfig::from_cli(&args).is_err());
    }

    #[test]
    fn test_thread_budget() {
        assert!(check_thread_budget("measured", 50_000, None).is_ok());
        assert!(check_thread_budget("measured", 100, Some(24_001)).is_ok());
        assert!(matches!(
            check_thread_budget("measured", 50_000, Some(24_001)),
            Err(BenchmarkError::Config(_))
        ));
        // main and the sequencer count against the limit too
        assert!(check_thread_budget("warm-up", 23_999, Some(24_001)).is_ok());
        assert!(check_thread_budget("warm-up", 24_000, Some(24_001)).is_err());
    }

    #[test]
    fn test_workers_above_thread_limit_rejected() {
        if let Some(limit) = thread_limit().filter(|l| *l < u32::MAX as u64) {
            let config = BenchmarkConfig::new(
                EngineKind::Sequencer,
                RoundConfig::single_shot(limit as u32, 1, 1),
            );
            assert!(matches!(config.validate(), Err(BenchmarkError::Config(_))));

            let mut config = BenchmarkConfig::new(EngineKind::Sequencer, RoundConfig::single_shot(1, 1, 1));
            config.warmup.workers = limit as u32;
            assert!(matches!(config.validate(), Err(BenchmarkError::Config(_))));
        }
    }

    #[test]
    fn test_warmup_validation() {
        let mut config = BenchmarkConfig::new(EngineKind::Sequencer, RoundConfig::single_shot(1, 1, 1));
        config.warmup.workers = 0;
        assert!(matches!(config.validate(), Err(BenchmarkError::Config(_))));
    }
}
