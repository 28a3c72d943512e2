//! Error types for sync-overhead-bench

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialization guarantee was broken (send after close, lost producer,
    /// engine panic, counter mismatch). Never recovered from.
    #[error("Synchronization defect: {0}")]
    Synchronization(String),

    #[error("Deadline of {waited:?} expired while waiting for {phase}")]
    Deadline { phase: String, waited: Duration },

    #[error("Failed to spawn thread: {0}")]
    Spawn(io::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Export error: {0}")]
    Export(String),
}

impl BenchmarkError {
    /// Build a deadline error for the named wait phase
    pub fn deadline(phase: &str, waited: Duration) -> Self {
        BenchmarkError::Deadline {
            phase: phase.to_string(),
            waited,
        }
    }

    /// Whether this error signals broken serialization rather than a setup problem
    pub fn is_synchronization_defect(&self) -> bool {
        matches!(self, BenchmarkError::Synchronization(_))
    }
}

pub type Result<T> = std::result::Result<T, BenchmarkError>;
