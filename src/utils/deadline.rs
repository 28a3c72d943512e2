//! Per-round wait deadline

use std::time::{Duration, Instant};

use super::error::BenchmarkError;

/// Upper bound on how long the orchestrator waits for producers and the
/// sequencer. Starts counting when created.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// Deadline expiring `budget` from now
    pub fn after(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    /// Time left before expiry (zero once expired)
    #[inline]
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }

    /// Fatal error for a wait that ran past this deadline
    pub fn expired(&self, phase: &str) -> BenchmarkError {
        BenchmarkError::deadline(phase, self.budget)
    }
}
