//! sync-overhead-bench library
//!
//! Measures what it costs to serialize access to a shared counter, either by
//! funnelling every mutation through a single sequencer thread over a
//! rendezvous channel, or by letting every producer take an exclusive lock.

pub mod benchmark;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod utils;
pub mod workload;
