//! Name → simulator table.
//!
//! The set of games is closed, so the registry is an enum plus one `match`
//! that builds the concrete model with its fixtures. Everything the CLI
//! needs goes through generic helpers and comes back as plain report
//! values, with states already rendered by [`Model::describe`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use super::catalog::{tests_dir, traces_dir, Catalog};
use super::contract::Model;
use crate::core::{HarnessError, HarnessResult, PlayerId, SimResult};
use crate::games::{
    Cellularena, MarsLander, ShadowsOfTheKnight1, ShadowsOfTheKnight2, TheFall, ThereIsNoSpoon,
};
use crate::replay::{self, Mismatch, Trace};
use crate::runner::{ProgramSpec, RunOutcome, RunStatus, Runner, RunnerConfig};

/// Trajectory states shown in a failure report.
pub const RECENT_STATES: usize = 5;

/// The supported games.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameKind {
    MarsLander,
    ShadowsOfTheKnight1,
    ShadowsOfTheKnight2,
    TheFall,
    ThereIsNoSpoon,
    Cellularena,
}

impl GameKind {
    pub const ALL: [GameKind; 6] = [
        GameKind::MarsLander,
        GameKind::ShadowsOfTheKnight1,
        GameKind::ShadowsOfTheKnight2,
        GameKind::TheFall,
        GameKind::ThereIsNoSpoon,
        GameKind::Cellularena,
    ];

    /// Registry name, also the fixture directory name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            GameKind::MarsLander => "mars_lander",
            GameKind::ShadowsOfTheKnight1 => "shadows_of_the_knight_1",
            GameKind::ShadowsOfTheKnight2 => "shadows_of_the_knight_2",
            GameKind::TheFall => "the_fall",
            GameKind::ThereIsNoSpoon => "there_is_no_spoon",
            GameKind::Cellularena => "cellularena",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| HarnessError::UnknownModel(s.to_string()))
    }
}

/// Build the model for `$kind` with its test cases from `$root`, bind it
/// to `$model` and evaluate `$body`.
macro_rules! with_model {
    ($kind:expr, $root:expr, |$model:ident| $body:expr) => {{
        let cases_dir = tests_dir($root, $kind.name());
        match $kind {
            GameKind::MarsLander => {
                let $model = MarsLander::new(Catalog::from_dir(&cases_dir));
                $body
            }
            GameKind::ShadowsOfTheKnight1 => {
                let $model = ShadowsOfTheKnight1::new(Catalog::from_dir(&cases_dir));
                $body
            }
            GameKind::ShadowsOfTheKnight2 => {
                let $model = ShadowsOfTheKnight2::new(Catalog::from_dir(&cases_dir));
                $body
            }
            GameKind::TheFall => {
                let $model = TheFall::new(Catalog::from_dir(&cases_dir));
                $body
            }
            GameKind::ThereIsNoSpoon => {
                let $model = ThereIsNoSpoon::new(Catalog::from_dir(&cases_dir));
                $body
            }
            GameKind::Cellularena => {
                let $model = Cellularena::new(Catalog::from_dir(&cases_dir));
                $body
            }
        }
    }};
}

/// A finished run with its states rendered as text.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub model: &'static str,
    pub case: String,
    pub status: RunStatus,
    pub turns: u32,
    pub final_state: String,
    /// `(turn, description)` of the last few turns, oldest first.
    pub recent: Vec<(u32, String)>,
    pub stderr: Vec<(PlayerId, Vec<String>)>,
}

impl RunSummary {
    fn from_outcome<M: Model>(model: &M, case: &str, outcome: RunOutcome<M::State>) -> Self {
        let trajectory = &outcome.trajectory;
        Self {
            model: model.name(),
            case: case.to_string(),
            turns: outcome.turns,
            final_state: model.describe(trajectory.last_state()),
            recent: trajectory
                .last(RECENT_STATES)
                .iter()
                .map(|record| (record.turn, model.describe(&record.state)))
                .collect(),
            status: outcome.status,
            stderr: outcome.stderr,
        }
    }
}

/// A finished replay with its states rendered as text.
#[derive(Clone, Debug, Serialize)]
pub struct ReplaySummary {
    pub model: &'static str,
    pub trace: String,
    pub test_case: String,
    pub turns: usize,
    pub result: SimResult,
    pub final_state: String,
    pub mismatches: Vec<Mismatch>,
}

impl ReplaySummary {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Outcome of checking one trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TraceVerdict {
    Ok,
    Mismatch { turn: u32 },
    /// The trace could not be replayed at all.
    Error(String),
}

impl fmt::Display for TraceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceVerdict::Ok => write!(f, "OK"),
            TraceVerdict::Mismatch { turn } => write!(f, "MISMATCH at turn {turn}"),
            TraceVerdict::Error(err) => write!(f, "ERROR: {err}"),
        }
    }
}

/// One line of a trace check.
#[derive(Clone, Debug, Serialize)]
pub struct TraceCheck {
    pub trace: String,
    pub verdict: TraceVerdict,
}

/// Entry point for everything keyed by model name.
#[derive(Clone, Debug)]
pub struct Registry {
    root: PathBuf,
}

impl Registry {
    /// Registry over the fixture tree at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `(name, description)` of every model.
    #[must_use]
    pub fn models(&self) -> Vec<(&'static str, &'static str)> {
        GameKind::ALL
            .into_iter()
            .map(|kind| with_model!(kind, &self.root, |model| (model.name(), model.description())))
            .collect()
    }

    /// `(name, title)` of the test cases of `kind`.
    #[must_use]
    pub fn test_cases(&self, kind: GameKind) -> Vec<(String, String)> {
        with_model!(kind, &self.root, |model| model.test_cases())
    }

    /// Names of the recorded traces of `kind`.
    #[must_use]
    pub fn traces(&self, kind: GameKind) -> Vec<String> {
        self.trace_catalog(kind).names().map(String::from).collect()
    }

    /// Load one trace by name.
    pub fn load_trace(&self, kind: GameKind, name: &str) -> HarnessResult<Trace> {
        self.trace_catalog(kind)
            .get(name)
            .cloned()
            .ok_or_else(|| HarnessError::TraceNotFound {
                model: kind.name(),
                name: name.to_string(),
            })
    }

    /// Play a test case against player programs.
    pub fn run(
        &self,
        kind: GameKind,
        case: &str,
        programs: &[ProgramSpec],
        config: RunnerConfig,
    ) -> HarnessResult<RunSummary> {
        let runner = Runner::new(config);
        with_model!(kind, &self.root, |model| {
            let outcome = runner.run(&model, case, programs)?;
            Ok(RunSummary::from_outcome(&model, case, outcome))
        })
    }

    /// Replay one named trace.
    pub fn replay(&self, kind: GameKind, trace_name: &str) -> HarnessResult<ReplaySummary> {
        let trace = self.load_trace(kind, trace_name)?;
        with_model!(kind, &self.root, |model| replay_summary(&model, trace_name, &trace))
    }

    /// Replay every trace of `kind`, in name order.
    #[must_use]
    pub fn check_traces(&self, kind: GameKind) -> Vec<TraceCheck> {
        let traces = self.trace_catalog(kind);
        with_model!(kind, &self.root, |model| {
            traces
                .names()
                .filter_map(|name| traces.get(name).map(|trace| (name, trace)))
                .map(|(name, trace)| TraceCheck {
                    trace: name.to_string(),
                    verdict: match replay_summary(&model, name, trace) {
                        Ok(summary) => match summary.mismatches.first() {
                            None => TraceVerdict::Ok,
                            Some(first) => TraceVerdict::Mismatch { turn: first.turn },
                        },
                        Err(err) => TraceVerdict::Error(err.to_string()),
                    },
                })
                .collect()
        })
    }

    fn trace_catalog(&self, kind: GameKind) -> Catalog<Trace> {
        Catalog::from_dir(&traces_dir(&self.root, kind.name()))
    }
}

fn replay_summary<M: Model>(
    model: &M,
    trace_name: &str,
    trace: &Trace,
) -> HarnessResult<ReplaySummary> {
    let report = replay::replay(model, trace_name, trace)?;
    Ok(ReplaySummary {
        model: model.name(),
        final_state: model.describe(report.trajectory.last_state()),
        turns: report.turns(),
        trace: report.trace,
        test_case: report.test_case,
        result: report.result,
        mismatches: report.mismatches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_kind_names_roundtrip() {
        for kind in GameKind::ALL {
            assert_eq!(kind.name().parse::<GameKind>().unwrap(), kind);
        }
        assert!(matches!(
            "pacman".parse::<GameKind>(),
            Err(HarnessError::UnknownModel(name)) if name == "pacman"
        ));
    }

    #[test]
    fn test_models_match_kind_names() {
        let registry = Registry::new("/nonexistent/fixtures");
        let names: Vec<&str> = registry.models().into_iter().map(|(name, _)| name).collect();
        let expected: Vec<&str> = GameKind::ALL.into_iter().map(GameKind::name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_empty_fixture_root() {
        let registry = Registry::new("/nonexistent/fixtures");
        assert!(registry.test_cases(GameKind::TheFall).is_empty());
        assert!(registry.traces(GameKind::Cellularena).is_empty());
        assert!(registry.check_traces(GameKind::MarsLander).is_empty());
        assert!(matches!(
            registry.load_trace(GameKind::MarsLander, "x"),
            Err(HarnessError::TraceNotFound { .. })
        ));
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(TraceVerdict::Ok.to_string(), "OK");
        assert_eq!(TraceVerdict::Mismatch { turn: 4 }.to_string(), "MISMATCH at turn 4");
    }
}
