//! Producer seed generation

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock derived seed: nanoseconds since the Unix epoch.
///
/// Not random in any meaningful sense; it only has to vary between producers
/// so the workload cannot be constant-folded.
pub fn wall_clock_seed() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

/// Seed used for the `k`-th admission of a looping producer
#[inline]
pub fn iteration_seed(base: i64, k: u32) -> i64 {
    base.wrapping_add(k as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock_seed_positive() {
        assert!(wall_clock_seed() > 0);
    }

    #[test]
    fn test_iteration_seed() {
        assert_eq!(iteration_seed(100, 0), 100);
        assert_eq!(iteration_seed(100, 5), 105);
        assert_eq!(iteration_seed(i64::MAX, 1), i64::MIN);
    }
}
