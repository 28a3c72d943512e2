//! Warm-up round
//!
//! One scaled-down round through the active engine before anything is
//! measured, so thread creation, the allocator and the scheduler are past
//! their cold-start behaviour when round 0 begins. Its metrics are dropped.

use std::time::{Duration, Instant};

use tracing::debug;

use super::round::RoundRunner;
use crate::config::WarmupConfig;
use crate::engine::EngineKind;
use crate::utils::{BenchmarkError, Result};

/// Runs the discarded warm-up round
pub struct WarmupController {
    runner: RoundRunner,
}

impl WarmupController {
    pub fn new(engine: EngineKind, config: &WarmupConfig, stack_size: usize, deadline: Duration) -> Self {
        Self {
            runner: RoundRunner::new(engine, &config.as_round(), stack_size, deadline),
        }
    }

    /// Run the warm-up round and discard its state.
    ///
    /// A counter mismatch here is already a synchronization defect.
    pub fn run(&self) -> Result<()> {
        let start = Instant::now();
        let outcome = self.runner.run()?;
        let expected = self.runner.expected_units();

        if outcome.state.counter != expected {
            return Err(BenchmarkError::Synchronization(format!(
                "warm-up counter {} != {} dispatched units",
                outcome.state.counter, expected
            )));
        }

        debug!(
            units = expected,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "warm-up complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PRODUCER_STACK;

    #[test]
    fn test_default_warmup_both_engines() {
        for engine in [EngineKind::Sequencer, EngineKind::Mutex] {
            let controller = WarmupController::new(
                engine,
                &WarmupConfig::default(),
                DEFAULT_PRODUCER_STACK,
                Duration::from_secs(60),
            );
            controller.run().unwrap();
        }
    }

    #[test]
    fn test_looping_warmup() {
        let config = WarmupConfig {
            workers: 10,
            loop_intensity: 10,
            increments_per_worker: Some(100),
        };
        let controller =
            WarmupController::new(EngineKind::Mutex, &config, DEFAULT_PRODUCER_STACK, Duration::from_secs(60));
        controller.run().unwrap();
    }
}
