//! Message-passing engine
//!
//! A single sequencer thread owns the round state. Producers hand it seeds
//! over a zero-capacity `sync_channel`, so a send completes only when the
//! sequencer is parked in `recv`; at most one request is ever in flight and
//! the state needs no lock.
//!
//! Lifecycle: `Idle -> Running -> Draining -> Terminated`. The orchestrator
//! closes the channel (drops the last sender) only after every producer has
//! finished; the thread then processes anything still pending and exits,
//! handing the state back.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use hdrhistogram::Histogram;
use tracing::debug;

use super::Admission;
use crate::metrics::latency::{new_latency_histogram, record_duration};
use crate::utils::{BenchmarkError, Deadline, Result};
use crate::workload::RoundState;

/// Observable sequencer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SequencerPhase {
    /// Thread spawned but not yet receiving
    Idle = 0,
    /// Receiving and processing requests
    Running = 1,
    /// Channel closed, processing what was already sent
    Draining = 2,
    /// Thread exited and returned the state
    Terminated = 3,
}

impl SequencerPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Terminated,
        }
    }
}

/// What the sequencer hands back when it terminates
pub struct SequencerReport {
    /// Round state after the last request
    pub state: RoundState,
    /// Duration of every critical-section execution
    pub histogram: Histogram<u64>,
}

/// Producer-side handle on the request channel
#[derive(Clone)]
pub struct RequestSender(SyncSender<i64>);

impl Admission for RequestSender {
    fn admit(&self, seed: i64) -> Result<()> {
        self.0.send(seed).map_err(|_| {
            BenchmarkError::Synchronization(
                "request sent after the sequencer stopped receiving".to_string(),
            )
        })
    }
}

/// Running sequencer engine
pub struct Sequencer {
    phase: Arc<AtomicU8>,
    /// Root sender; dropping it (once every producer clone is gone) closes the channel
    requests: Option<RequestSender>,
    report_rx: Receiver<SequencerReport>,
    handle: Option<JoinHandle<()>>,
}

impl Sequencer {
    /// Spawn the sequencer thread, moving `state` into it
    pub fn start(state: RoundState, intensity: u32) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::sync_channel::<i64>(0);
        let (report_tx, report_rx) = mpsc::channel();
        let phase = Arc::new(AtomicU8::new(SequencerPhase::Idle as u8));

        let thread_phase = Arc::clone(&phase);
        let handle = thread::Builder::new()
            .name("sequencer".to_string())
            .spawn(move || {
                let report = Self::run(request_rx, state, intensity, &thread_phase);
                thread_phase.store(SequencerPhase::Terminated as u8, Ordering::SeqCst);
                let _ = report_tx.send(report);
            })
            .map_err(BenchmarkError::Spawn)?;

        Ok(Self {
            phase,
            requests: Some(RequestSender(request_tx)),
            report_rx,
            handle: Some(handle),
        })
    }

    /// Receive loop. Returns once the channel is closed and drained.
    ///
    /// Each sample is recorded before the next `recv`, so it lengthens the
    /// rendezvous cycle by one histogram increment. `MutexEngine` records
    /// while holding its guard, which costs the lock hold time the same.
    fn run(
        requests: Receiver<i64>,
        mut state: RoundState,
        intensity: u32,
        phase: &AtomicU8,
    ) -> SequencerReport {
        let _ = phase.compare_exchange(
            SequencerPhase::Idle as u8,
            SequencerPhase::Running as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );

        let mut histogram = new_latency_histogram();
        for seed in requests.iter() {
            let elapsed = state.execute(seed, intensity);
            record_duration(&mut histogram, elapsed);
        }

        debug!(processed = state.counter, "sequencer drained");
        SequencerReport { state, histogram }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SequencerPhase {
        SequencerPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// A sender for one producer, or `None` once the channel has been closed
    pub fn sender(&self) -> Option<RequestSender> {
        self.requests.clone()
    }

    /// Drop the root sender. The channel closes once every producer clone is
    /// gone too; call only after all producers have finished.
    pub fn close(&mut self) {
        if self.requests.take().is_some() {
            let _ = self
                .phase
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                    if current == SequencerPhase::Terminated as u8 {
                        None
                    } else {
                        Some(SequencerPhase::Draining as u8)
                    }
                });
        }
    }

    /// Close (if still open) and wait for the thread to terminate
    pub fn wait(mut self, deadline: &Deadline) -> Result<SequencerReport> {
        self.close();

        let report = match self.report_rx.recv_timeout(deadline.remaining()) {
            Ok(report) => report,
            Err(RecvTimeoutError::Timeout) => return Err(deadline.expired("sequencer drain")),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(BenchmarkError::Synchronization(
                    "sequencer exited without returning its state".to_string(),
                ))
            }
        };

        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| {
                BenchmarkError::Synchronization("sequencer thread panicked".to_string())
            })?;
        }

        Ok(report)
    }
}
