//! # puzzle-harness
//!
//! Reference simulators and a test harness for turn-based puzzle bots.
//!
//! A bot is an external program speaking a line protocol on stdin/stdout.
//! The harness feeds it the game state, parses its commands, advances a
//! deterministic reference engine and reports how the game ended. Recorded
//! traces can be replayed against the same engines to check them.
//!
//! ## Design Principles
//!
//! 1. **One contract**: every game implements [`Model`]. The runner and the
//!    replay engine only ever talk to that trait.
//!
//! 2. **Pure steps**: `simulate` takes the previous state by reference and
//!    returns a new one. States use `im` collections so keeping every state
//!    of a game is cheap.
//!
//! 3. **Explicit environments**: per-case configuration is passed into
//!    every call. Models keep no "current game".
//!
//! ## Modules
//!
//! - `core`: player seats, grid geometry, step results, errors
//! - `model`: the `Model` trait, fixture catalogs, the game registry
//! - `games`: the six simulators
//! - `runner`: subprocess driver with per-turn timeouts
//! - `replay`: trace replay and state comparison

pub mod core;
pub mod games;
pub mod model;
pub mod replay;
pub mod runner;

// Re-export commonly used types
pub use crate::core::{
    Dir, GridPos, HarnessError, HarnessResult, ParseError, PlayerId, PlayerMap, SimResult,
};

pub use crate::model::{Catalog, CatalogEntry, GameKind, Model, Registry};

pub use crate::games::{
    Cellularena, MarsLander, ShadowsOfTheKnight1, ShadowsOfTheKnight2, TheFall, ThereIsNoSpoon,
};

pub use crate::runner::{
    ProgramSpec, RunOutcome, RunStatus, Runner, RunnerConfig, Trajectory, TurnRecord,
};

pub use crate::replay::{replay, Mismatch, ReplayReport, Trace, TraceEntry};
