//! Trace replay and state comparison.
//!
//! A trace is a recorded game from the reference engine. Replaying it runs
//! the same commands through a simulator, without any subprocess, and
//! reports every turn where the simulator's state differs from the record.

pub mod engine;
pub mod trace;

pub use engine::{replay, Mismatch, ReplayReport};
pub use trace::{Trace, TraceEntry};
