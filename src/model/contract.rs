//! The capability interface every game simulator implements.
//!
//! Games implement `Model` to define:
//! - How a named test case becomes an environment and an initial state
//! - What the player program is told before and during the game
//! - How program output lines become commands
//! - How one turn of commands changes the state
//!
//! The runner and the replay engine call into `Model` but never interpret
//! game-specific concepts directly.

use std::fmt::Debug;

use crate::core::{HarnessResult, ParseError, PlayerId, SimResult};
use crate::replay::TraceEntry;

/// Game simulator contract.
///
/// ## Implementation Notes
///
/// - `Env` is built once per test case and only ever borrowed afterwards.
/// - `simulate` must be a pure function of its arguments: the same state,
///   commands and environment always produce the same new state and result.
///   Any precision a game keeps between turns lives inside `State`.
/// - A rejected command must leave the state untouched unless the game's
///   rules define a side effect for the rejection.
/// - `compare_state` reports differences as human-readable strings and
///   never fails; an empty vector means the state matches.
pub trait Model {
    /// Immutable per-test-case configuration.
    type Env: Debug;
    /// Complete dynamic world snapshot.
    type State: Clone + Debug;
    /// One parsed output line.
    type Control: Clone + Debug;

    /// Registry name, e.g. `mars_lander`.
    fn name(&self) -> &'static str;

    /// Human-readable title.
    fn description(&self) -> &'static str;

    /// Known test cases as `(name, title)` pairs, sorted by name.
    fn test_cases(&self) -> Vec<(String, String)>;

    /// Build the environment and initial state for a test case.
    ///
    /// Fails with `HarnessError::TestCaseNotFound` for unregistered names.
    fn load_test_case(&self, name: &str) -> HarnessResult<(Self::Env, Self::State)>;

    /// Number of player programs the test case needs.
    fn player_count(&self, _env: &Self::Env) -> usize {
        1
    }

    /// Lines sent once to every program before the first turn.
    fn format_init_input(&self, env: &Self::Env) -> Vec<String>;

    /// Lines sent to `player` at the start of each turn. May be empty.
    fn format_turn_input(
        &self,
        state: &Self::State,
        env: &Self::Env,
        player: PlayerId,
    ) -> Vec<String>;

    /// Parse one output line written by `player`.
    fn parse_output(&self, line: &str, player: PlayerId) -> Result<Self::Control, ParseError>;

    /// Advance the world by one turn.
    ///
    /// `controls` holds every command collected for the turn, in player
    /// order. Single-agent games receive exactly one.
    fn simulate(
        &self,
        state: &Self::State,
        controls: &[Self::Control],
        env: &Self::Env,
    ) -> (Self::State, SimResult);

    /// Diff a state against the expected fields of a trace entry.
    fn compare_state(&self, state: &Self::State, expected: &TraceEntry) -> Vec<String>;

    /// Number of output lines `player` must write this turn.
    fn required_actions(&self, _state: &Self::State, _player: PlayerId) -> usize {
        1
    }

    /// One-line state summary for logs and reports.
    fn describe(&self, state: &Self::State) -> String;
}
