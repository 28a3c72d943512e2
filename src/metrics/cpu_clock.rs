//! Process CPU-time sampling
//!
//! The orchestrator samples the clock exactly twice per round. A `None`
//! sample degrades that round's CPU usage to unavailable instead of failing.

use std::time::Duration;

/// Source of accumulated process CPU time (user + system)
pub trait CpuClock: Send + Sync {
    /// Total CPU time consumed by the process so far, if it can be read
    fn sample(&self) -> Option<Duration>;
}

/// `getrusage(RUSAGE_SELF)` backed clock
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessCpuClock;

impl ProcessCpuClock {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl CpuClock for ProcessCpuClock {
    fn sample(&self) -> Option<Duration> {
        // SAFETY: rusage is plain old data; all-zero bytes is a valid value.
        let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
        // SAFETY: getrusage writes into the struct we own and touches nothing else.
        let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
        if ret != 0 {
            return None;
        }
        Some(timeval_to_duration(usage.ru_utime) + timeval_to_duration(usage.ru_stime))
    }
}

#[cfg(not(unix))]
impl CpuClock for ProcessCpuClock {
    fn sample(&self) -> Option<Duration> {
        None
    }
}

#[cfg(unix)]
fn timeval_to_duration(tv: libc::timeval) -> Duration {
    Duration::from_secs(tv.tv_sec.max(0) as u64) + Duration::from_micros(tv.tv_usec.max(0) as u64)
}

/// CPU time consumed between two samples; `None` if either is missing
pub fn cpu_time_between(start: Option<Duration>, end: Option<Duration>) -> Option<Duration> {
    match (start, end) {
        (Some(start), Some(end)) => Some(end.saturating_sub(start)),
        _ => None,
    }
}
