//! One round against one engine: arm, dispatch, drain, hand back state

use std::sync::Arc;
use std::time::Duration;

use hdrhistogram::Histogram;

use super::dispatcher::Dispatcher;
use crate::config::RoundConfig;
use crate::engine::{EngineKind, MutexEngine, Sequencer};
use crate::utils::{BenchmarkError, Deadline, Result};
use crate::workload::RoundState;

/// Everything a finished round hands back to the orchestrator
pub struct RoundOutcome {
    /// Round state after the last critical section
    pub state: RoundState,
    /// Units the producers admitted
    pub units: u64,
    /// Critical-section latency distribution
    pub latency: Histogram<u64>,
}

/// Runs a single round of the configured shape
#[derive(Debug, Clone, Copy)]
pub struct RoundRunner {
    engine: EngineKind,
    intensity: u32,
    dispatcher: Dispatcher,
    deadline: Duration,
}

impl RoundRunner {
    pub fn new(engine: EngineKind, config: &RoundConfig, stack_size: usize, deadline: Duration) -> Self {
        Self {
            engine,
            intensity: config.loop_intensity,
            dispatcher: Dispatcher::for_round(config, stack_size),
            deadline,
        }
    }

    pub fn expected_units(&self) -> u64 {
        self.dispatcher.expected_units()
    }

    /// Run the round on fresh, zeroed state
    pub fn run(&self) -> Result<RoundOutcome> {
        let deadline = Deadline::after(self.deadline);
        let state = RoundState::new();
        let outcome = match self.engine {
            EngineKind::Sequencer => self.run_sequencer(state, &deadline)?,
            EngineKind::Mutex => self.run_mutex(state, &deadline)?,
        };
        check_admitted(outcome.units, self.expected_units())?;
        Ok(outcome)
    }

    fn run_sequencer(&self, state: RoundState, deadline: &Deadline) -> Result<RoundOutcome> {
        // Sequencer is receiving before the first producer exists
        let mut sequencer = Sequencer::start(state, self.intensity)?;
        let sender = sequencer.sender().ok_or_else(|| {
            BenchmarkError::Synchronization("request channel closed before dispatch".to_string())
        })?;

        let units = self.dispatcher.dispatch(&sender, deadline);
        drop(sender);
        let units = units?;

        // Every producer has finished; closing now cannot strand a send
        sequencer.close();
        let report = sequencer.wait(deadline)?;

        Ok(RoundOutcome {
            state: report.state,
            units,
            latency: report.histogram,
        })
    }

    fn run_mutex(&self, state: RoundState, deadline: &Deadline) -> Result<RoundOutcome> {
        let engine = Arc::new(MutexEngine::new(state, self.intensity));
        let units = self.dispatcher.dispatch(&engine, deadline)?;
        let report = engine.take_report();

        Ok(RoundOutcome {
            state: report.state,
            units,
            latency: report.histogram,
        })
    }
}

/// Every producer must have admitted its full share before the counter is
/// worth comparing
fn check_admitted(units: u64, expected: u64) -> Result<()> {
    if units != expected {
        return Err(BenchmarkError::Synchronization(format!(
            "producers admitted {} units, {} dispatched",
            units, expected
        )));
    }
    Ok(())
}
