//! Subprocess runner: plays test cases against real player programs.
//!
//! ## Protocol
//!
//! 1. Spawn one program per player
//! 2. Send the init lines to every program
//! 3. Each turn: send every program its turn input, then read the required
//!    number of lines from each program in seat order
//! 4. Simulate the collected commands; stop at a terminal result, a protocol
//!    fault or the turn limit
//! 5. Close stdin, terminate, kill after a grace period

pub mod config;
pub mod process;
pub mod session;
pub mod trajectory;

pub use config::RunnerConfig;
pub use process::{LineRead, PlayerProcess, ProgramSpec};
pub use session::{RunOutcome, RunStatus, Runner};
pub use trajectory::{Trajectory, TurnRecord};
