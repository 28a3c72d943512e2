//! Workload dispatcher
//!
//! Spawns one OS thread per producer. Each producer owns its own clone of
//! the engine's admission handle and reports back over a completion channel,
//! so the orchestrator can bound its wait with a deadline instead of blocking
//! in `join`.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use tracing::debug;

use crate::config::RoundConfig;
use crate::engine::Admission;
use crate::utils::{BenchmarkError, Deadline, Result};
use crate::workload::{iteration_seed, wall_clock_seed};

/// Spawns and awaits the producers of one round
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    workers: u32,
    increments: Option<u32>,
    stack_size: usize,
}

impl Dispatcher {
    pub fn new(workers: u32, increments: Option<u32>, stack_size: usize) -> Self {
        Self {
            workers,
            increments,
            stack_size,
        }
    }

    /// Dispatcher for the producers described by `config`
    pub fn for_round(config: &RoundConfig, stack_size: usize) -> Self {
        Self::new(config.workers, config.increments_per_worker, stack_size)
    }

    /// Units each producer admits
    pub fn units_per_producer(&self) -> u64 {
        self.increments.unwrap_or(1) as u64
    }

    /// Units admitted across all producers
    pub fn expected_units(&self) -> u64 {
        self.workers as u64 * self.units_per_producer()
    }

    /// Spawn every producer against `admission` and wait until all of them
    /// have finished, or `deadline` expires. Returns the units admitted.
    pub fn dispatch<A: Admission>(&self, admission: &A, deadline: &Deadline) -> Result<u64> {
        let (done_tx, done_rx) = mpsc::channel::<Result<u64>>();
        let mut handles = Vec::with_capacity(self.workers as usize);

        for producer_id in 0..self.workers {
            let admission = admission.clone();
            let done_tx = done_tx.clone();
            let increments = self.increments;

            let handle = thread::Builder::new()
                .name(format!("producer-{}", producer_id))
                .stack_size(self.stack_size)
                .spawn(move || {
                    let outcome = produce(&admission, increments);
                    // Release the engine handle before reporting, so that once
                    // every report is in no producer can still reach the engine.
                    drop(admission);
                    let _ = done_tx.send(outcome);
                })
                .map_err(BenchmarkError::Spawn)?;

            handles.push(handle);
        }
        drop(done_tx);

        let mut units = 0u64;
        let mut first_error = None;

        for _ in 0..self.workers {
            match done_rx.recv_timeout(deadline.remaining()) {
                Ok(Ok(admitted)) => units += admitted,
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Err(deadline.expired("producers")),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(BenchmarkError::Synchronization(
                        "producer exited without reporting".to_string(),
                    ))
                }
            }
        }

        for handle in handles {
            handle.join().map_err(|_| {
                BenchmarkError::Synchronization("producer thread panicked".to_string())
            })?;
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        debug!(producers = self.workers, units, "all producers finished");
        Ok(units)
    }
}

/// Body of one producer thread. Returns the units it admitted; keeps no
/// per-unit state.
fn produce<A: Admission>(admission: &A, increments: Option<u32>) -> Result<u64> {
    let seed = wall_clock_seed();

    match increments {
        None => {
            admission.admit(seed)?;
            Ok(1)
        }
        Some(n) => {
            for k in 0..n {
                admission.admit(iteration_seed(seed, k))?;
            }
            Ok(n as u64)
        }
    }
}
