//! Critical-section workload and producer seeds

pub mod critical_section;
pub mod seed;

pub use critical_section::{critical_section, RoundState, WORKLOAD_MULTIPLIER};
pub use seed::{iteration_seed, wall_clock_seed};
