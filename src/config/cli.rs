//! Command-line argument parsing
//!
//! Arguments are grouped by category for clarity.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::engine::EngineKind;

/// Compare rendezvous-channel and mutex serialization of a shared counter
#[derive(Parser, Debug, Clone)]
#[command(name = "sync-overhead-bench")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    // ===== Engine =====
    /// Synchronization engine to benchmark
    #[arg(short = 'e', long = "engine", value_enum, default_value_t = EngineKind::Sequencer)]
    pub engine: EngineKind,

    // ===== Workload =====
    /// Number of concurrent producer threads per round
    #[arg(short = 'w', long = "workers", default_value_t = 1000)]
    pub workers: u32,

    /// Work units per producer (omit for one unit per producer)
    #[arg(short = 'n', long = "increments")]
    pub increments: Option<u32>,

    /// Iterations of the critical-section workload
    #[arg(short = 'i', long = "intensity", default_value_t = 1000)]
    pub intensity: u32,

    /// Number of measured rounds
    #[arg(short = 'r', long = "rounds", default_value_t = 10)]
    pub rounds: u32,

    // ===== Warm-up =====
    /// Producers in the warm-up round
    #[arg(long = "warmup-workers", default_value_t = 100)]
    pub warmup_workers: u32,

    /// Workload intensity in the warm-up round
    #[arg(long = "warmup-intensity", default_value_t = 10)]
    pub warmup_intensity: u32,

    /// Work units per producer in the warm-up round
    #[arg(long = "warmup-increments")]
    pub warmup_increments: Option<u32>,

    // ===== Timing Options =====
    /// Per-round deadline in seconds for producers and the sequencer
    #[arg(long = "deadline-secs", default_value_t = 3600)]
    pub deadline_secs: u64,

    /// Producer thread stack size in KiB
    #[arg(long = "stack-kb", default_value_t = 64)]
    pub stack_kb: usize,

    // ===== Output Options =====
    /// Output JSON file path
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Stdout format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Output CSV file with one row per round
    #[arg(long = "csv")]
    pub csv_output: Option<PathBuf>,

    /// Quiet mode (minimal output)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format for results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("--workers must be at least 1".to_string());
        }
        if self.increments == Some(0) {
            return Err("--increments must be at least 1".to_string());
        }
        if self.intensity == 0 {
            return Err("--intensity must be at least 1".to_string());
        }
        if self.rounds == 0 {
            return Err("--rounds must be at least 1".to_string());
        }
        if self.warmup_workers == 0 || self.warmup_intensity == 0 {
            return Err("--warmup-workers and --warmup-intensity must be at least 1".to_string());
        }
        if self.warmup_increments == Some(0) {
            return Err("--warmup-increments must be at least 1".to_string());
        }
        if self.deadline_secs == 0 {
            return Err("--deadline-secs must be at least 1".to_string());
        }
        if self.stack_kb < 16 {
            return Err("--stack-kb must be at least 16".to_string());
        }
        if self.quiet && self.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["test"]);
        assert_eq!(args.engine, EngineKind::Sequencer);
        assert_eq!(args.workers, 1000);
        assert_eq!(args.increments, None);
        assert_eq!(args.rounds, 10);
        assert_eq!(args.warmup_workers, 100);
        assert_eq!(args.warmup_intensity, 10);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_loop_variant_args() {
        let args = CliArgs::parse_from([
            "test", "-e", "mutex", "-w", "50", "-n", "20", "-i", "1", "-r", "3",
        ]);
        assert_eq!(args.engine, EngineKind::Mutex);
        assert_eq!(args.workers, 50);
        assert_eq!(args.increments, Some(20));
        assert_eq!(args.intensity, 1);
        assert_eq!(args.rounds, 3);
    }

    #[test]
    fn test_validation_zero_counts() {
        assert!(CliArgs::parse_from(["test", "-w", "0"]).validate().is_err());
        assert!(CliArgs::parse_from(["test", "-n", "0"]).validate().is_err());
        assert!(CliArgs::parse_from(["test", "-i", "0"]).validate().is_err());
        assert!(CliArgs::parse_from(["test", "-r", "0"]).validate().is_err());
    }

    #[test]
    fn test_validation_negative_rejected_by_parser() {
        assert!(CliArgs::try_parse_from(["test", "-w", "-5"]).is_err());
    }

    #[test]
    fn test_validation_quiet_and_verbose() {
        let args = CliArgs::parse_from(["test", "-q", "-v"]);
        assert!(args.validate().is_err());
    }
}
