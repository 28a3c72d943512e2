//! Configuration module

pub mod benchmark_config;
pub mod cli;

pub use benchmark_config::{
    BenchmarkConfig, RoundConfig, WarmupConfig, DEFAULT_DEADLINE, DEFAULT_PRODUCER_STACK,
};
pub use cli::{CliArgs, OutputFormat};
