//! Lock-based engine
//!
//! Producers call `increment` directly; a `parking_lot::Mutex` serializes
//! them around the same critical section the sequencer runs. The guard is
//! scoped to the call, so the lock is released on every exit path including
//! unwinding (parking_lot does not poison).

use std::sync::Arc;
use std::time::Duration;

use hdrhistogram::Histogram;
use parking_lot::Mutex;

use super::Admission;
use crate::metrics::latency::{new_latency_histogram, record_duration};
use crate::utils::Result;
use crate::workload::RoundState;

/// Everything the lock protects
struct Guarded {
    state: RoundState,
    histogram: Histogram<u64>,
}

/// What the engine hands back once the round is over
pub struct MutexReport {
    /// Round state after the last increment
    pub state: RoundState,
    /// Duration of every critical-section execution
    pub histogram: Histogram<u64>,
}

/// Round state behind an exclusive lock
pub struct MutexEngine {
    inner: Mutex<Guarded>,
    intensity: u32,
}

impl MutexEngine {
    /// Wrap the orchestrator's round state
    pub fn new(state: RoundState, intensity: u32) -> Self {
        Self {
            inner: Mutex::new(Guarded {
                state,
                histogram: new_latency_histogram(),
            }),
            intensity,
        }
    }

    /// Run one critical section under the lock.
    ///
    /// Returns the wall time spent in the workload. The sample is recorded
    /// before the guard drops, mirroring the sequencer's receive loop.
    #[inline]
    pub fn increment(&self, seed: i64) -> Duration {
        let mut guard = self.inner.lock();
        let elapsed = guard.state.execute(seed, self.intensity);
        record_duration(&mut guard.histogram, elapsed);
        elapsed
    }

    /// Run `f` with exclusive access to the state; the lock is held for
    /// exactly the duration of the call.
    #[inline]
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&mut RoundState) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard.state)
    }

    /// Take state and histogram out, leaving a zeroed engine behind
    pub fn take_report(&self) -> MutexReport {
        let mut guard = self.inner.lock();
        MutexReport {
            state: std::mem::take(&mut guard.state),
            histogram: std::mem::replace(&mut guard.histogram, new_latency_histogram()),
        }
    }
}

impl Admission for Arc<MutexEngine> {
    #[inline]
    fn admit(&self, seed: i64) -> Result<()> {
        self.increment(seed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::critical_section;
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;

    #[test]
    fn test_single_increment() {
        let engine = MutexEngine::new(RoundState::new(), 3);
        let elapsed = engine.increment(1);

        let report = engine.take_report();
        assert_eq!(report.state.counter, 1);
        assert_eq!(report.state.junk, 29824);
        assert_eq!(report.state.critical_time, elapsed);
        assert_eq!(report.histogram.len(), 1);
    }

    #[test]
    fn test_concurrent_increments() {
        let engine = Arc::new(MutexEngine::new(RoundState::new(), 50));

        let handles: Vec<_> = (0..16)
            .map(|t| {
                let e = Arc::clone(&engine);
                thread::spawn(move || {
                    let mut total = Duration::ZERO;
                    for k in 0..100 {
                        total += e.increment(t * 10_000 + k);
                    }
                    total
                })
            })
            .collect();

        let caller_total: Duration = handles.into_iter().map(|h| h.join().unwrap()).sum();

        let report = engine.take_report();
        assert_eq!(report.state.counter, 1600);
        assert_eq!(report.state.critical_time, caller_total);
        assert_eq!(report.histogram.len(), 1600);
        let last = report.state.last_seed.unwrap();
        assert_eq!(report.state.junk, critical_section(last, 50));

        let after = engine.take_report();
        assert_eq!(after.state, RoundState::new());
        assert!(after.histogram.is_empty());
    }

    #[test]
    fn test_admit_increments() {
        let engine = Arc::new(MutexEngine::new(RoundState::new(), 1));
        engine.admit(1).unwrap();
        engine.admit(2).unwrap();
        assert_eq!(engine.with_exclusive(|state| state.counter), 2);
    }

    #[test]
    fn test_lock_released_after_panic() {
        let engine = MutexEngine::new(RoundState::new(), 1);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.with_exclusive(|_| panic!("critical section failed"))
        }));
        assert!(result.is_err());

        // Lock must be free again
        engine.increment(5);
        assert_eq!(engine.with_exclusive(|state| state.counter), 1);
    }
}
