//! The critical-section workload shared by both engines
//!
//! Both engines run exactly this computation and exactly this state mutation,
//! so the only thing a round can measure differently between them is how
//! work units are admitted into the serialized region.

use std::time::{Duration, Instant};

/// Multiplier applied on every workload iteration
pub const WORKLOAD_MULTIPLIER: i64 = 31;

/// Deterministic CPU-bound work: `result = seed`, then
/// `result = result * 31 + i` for every `i` in `0..intensity`.
///
/// Overflow wraps (two's complement); large intensities overflow by design.
#[inline]
pub fn critical_section(seed: i64, intensity: u32) -> i64 {
    let mut result = seed;
    for i in 0..intensity {
        result = result
            .wrapping_mul(WORKLOAD_MULTIPLIER)
            .wrapping_add(i as i64);
    }
    result
}

/// Mutable state of one round
///
/// Exactly one mutator touches this at a time: the sequencer thread that owns
/// it, or whichever producer currently holds the mutex engine's lock.
/// A fresh value is created for every round and for the warm-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundState {
    /// Completed critical-section executions
    pub counter: u64,
    /// Result of the most recent critical-section execution
    pub junk: i64,
    /// Seed consumed by the most recent execution
    pub last_seed: Option<i64>,
    /// Wall time accumulated inside the critical section
    pub critical_time: Duration,
}

impl RoundState {
    /// Create zeroed state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed execution. The single mutation both engines share.
    #[inline]
    pub fn apply(&mut self, seed: i64, result: i64) {
        self.junk = result;
        self.last_seed = Some(seed);
        self.counter += 1;
    }

    /// Run the workload for `seed`, apply it, and add the wall time spent to
    /// `critical_time`. Returns that wall time.
    ///
    /// Callers must already have exclusive access (ownership or a held lock).
    #[inline]
    pub fn execute(&mut self, seed: i64, intensity: u32) -> Duration {
        let start = Instant::now();
        let result = critical_section(seed, intensity);
        self.apply(seed, result);
        let elapsed = start.elapsed();
        self.critical_time += elapsed;
        elapsed
    }

    /// Whether the junk value is consistent with the last executed seed
    pub fn junk_matches(&self, intensity: u32) -> bool {
        match self.last_seed {
            Some(seed) => critical_section(seed, intensity) == self.junk,
            None => self.junk == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_intensity_is_identity() {
        assert_eq!(critical_section(42, 0), 42);
        assert_eq!(critical_section(-7, 0), -7);
    }

    #[test]
    fn test_known_values() {
        // 1 -> 31 -> 962 -> 29824
        assert_eq!(critical_section(1, 1), 31);
        assert_eq!(critical_section(1, 2), 962);
        assert_eq!(critical_section(1, 3), 29824);
    }

    #[test]
    fn test_overflow_wraps() {
        let seed = i64::MAX;
        let expected = seed.wrapping_mul(31).wrapping_add(0);
        assert_eq!(critical_section(seed, 1), expected);
        // Large intensities must not panic in debug builds
        let _ = critical_section(1_700_000_000_000_000_000, 10_000);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(critical_section(123_456, 1000), critical_section(123_456, 1000));
    }

    #[test]
    fn test_apply_and_execute() {
        let mut state = RoundState::new();
        assert!(state.junk_matches(10));

        let first = state.execute(5, 10);
        let second = state.execute(9, 10);

        assert_eq!(state.counter, 2);
        assert_eq!(state.critical_time, first + second);
        assert_eq!(state.last_seed, Some(9));
        assert_eq!(state.junk, critical_section(9, 10));
        assert!(state.junk_matches(10));
    }
}
