//! Core harness types: player seats, grid geometry, step results, errors.
//!
//! Everything here is game-agnostic. Games build their own environments,
//! states and controls on top of these pieces.

pub mod error;
pub mod geometry;
pub mod player;
pub mod result;

pub use error::{HarnessError, HarnessResult, ParseError};
pub use geometry::{Dir, GridPos};
pub use player::{PlayerId, PlayerMap};
pub use result::SimResult;
