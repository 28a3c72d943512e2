//! Synchronization engines
//!
//! Two interchangeable ways of serializing access to a round's state:
//! - Sequencer: one thread owns the state, producers rendezvous with it over
//!   a zero-capacity channel
//! - MutexEngine: producers call `increment` directly under an exclusive lock
//!
//! Both run the same workload and the same state mutation, and both record
//! each execution's duration into one histogram on the serialized path.

pub mod mutex;
pub mod sequencer;

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::utils::Result;

pub use mutex::{MutexEngine, MutexReport};
pub use sequencer::{RequestSender, Sequencer, SequencerPhase, SequencerReport};

/// Which engine serializes the round
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Message passing through a rendezvous channel
    #[default]
    Sequencer,
    /// Exclusive lock around the critical section
    Mutex,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequencer => "sequencer",
            Self::Mutex => "mutex",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a producer hands one work unit to the active engine
///
/// Each producer thread owns its own clone.
pub trait Admission: Clone + Send + 'static {
    /// Admit one work unit seeded with `seed`, blocking until the engine has
    /// accepted it.
    fn admit(&self, seed: i64) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_value_enum() {
        assert_eq!(EngineKind::from_str("sequencer", true), Ok(EngineKind::Sequencer));
        assert_eq!(EngineKind::from_str("MUTEX", true), Ok(EngineKind::Mutex));
        assert!(EngineKind::from_str("spinlock", true).is_err());
    }

    #[test]
    fn test_engine_kind_display() {
        assert_eq!(EngineKind::Sequencer.to_string(), "sequencer");
        assert_eq!(EngineKind::Mutex.to_string(), "mutex");
    }
}
