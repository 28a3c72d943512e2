//! Benchmark orchestration and producers
//!
//! This module provides the round execution system:
//! - Dispatcher: spawns producer threads that feed the active engine
//! - RoundRunner: one isolated round against one engine
//! - WarmupController: the discarded warm-up round
//! - Orchestrator: warm-up, measured rounds, metrics

pub mod dispatcher;
pub mod orchestrator;
pub mod round;
pub mod warmup;

pub use dispatcher::Dispatcher;
pub use orchestrator::Orchestrator;
pub use round::{RoundOutcome, RoundRunner};
pub use warmup::WarmupController;
