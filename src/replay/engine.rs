//! Trace replay: feed recorded commands straight into `Model::simulate` and
//! diff every resulting state against the recorded fields.

use log::{debug, info};
use serde::Serialize;

use super::trace::{Trace, TraceEntry};
use crate::core::{HarnessError, HarnessResult, PlayerId, SimResult};
use crate::model::Model;
use crate::runner::{Trajectory, TurnRecord};

/// Differences found after one trace entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub turn: u32,
    pub diffs: Vec<String>,
}

/// Result of replaying one trace.
#[derive(Clone, Debug)]
pub struct ReplayReport<S> {
    pub trace: String,
    pub test_case: String,
    pub mismatches: Vec<Mismatch>,
    pub trajectory: Trajectory<S>,
    /// Result of the last simulated turn.
    pub result: SimResult,
}

impl<S> ReplayReport<S> {
    /// True when every entry matched.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }

    #[must_use]
    pub fn first_mismatch(&self) -> Option<&Mismatch> {
        self.mismatches.first()
    }

    /// Entries simulated.
    #[must_use]
    pub fn turns(&self) -> usize {
        self.trajectory.len()
    }
}

/// Replay `trace` (stored under `trace_name`) against `model`.
///
/// The trace's test case is loaded first; a missing case or a multi-agent
/// entry with the wrong number of slots is an error. Everything else the
/// engine disagrees with is reported as a mismatch. Replay stops at the
/// first unparsable command and at the first terminal result.
pub fn replay<M: Model>(
    model: &M,
    trace_name: &str,
    trace: &Trace,
) -> HarnessResult<ReplayReport<M::State>> {
    let test_case = trace.test_case_or(trace_name).to_string();
    let (env, initial) = model.load_test_case(&test_case)?;
    let players = model.player_count(&env);
    info!(
        "{}: replaying '{trace_name}' ({} entries, {})",
        model.name(),
        trace.len(),
        if trace.is_multi_agent() { "multi-agent" } else { "single-agent" }
    );

    let mut report = ReplayReport {
        trace: trace_name.to_string(),
        test_case,
        mismatches: Vec::new(),
        trajectory: Trajectory::new(initial),
        result: SimResult::Running,
    };

    for entry in &trace.cg_trace {
        if report.result.is_terminal() {
            report.mismatches.push(Mismatch {
                turn: entry.turn,
                diffs: vec![format!("trace continues after the game ended ({})", report.result)],
            });
            break;
        }

        let (controls, commands) = match parse_entry(model, entry, players)? {
            Ok(parsed) => parsed,
            Err(diff) => {
                report.mismatches.push(Mismatch {
                    turn: entry.turn,
                    diffs: vec![diff],
                });
                break;
            }
        };

        let (next, result) = model.simulate(report.trajectory.last_state(), &controls, &env);
        debug!("turn {}: {} [{result}]", entry.turn, model.describe(&next));

        let diffs = model.compare_state(&next, entry);
        if !diffs.is_empty() {
            debug!("turn {}: {} difference(s)", entry.turn, diffs.len());
            report.mismatches.push(Mismatch { turn: entry.turn, diffs });
        }

        report.result = result.clone();
        report.trajectory.push(TurnRecord {
            turn: entry.turn,
            commands,
            state: next,
            result,
        });
    }

    Ok(report)
}

/// Parsed controls and raw lines of one entry; the inner `Err` is a parse
/// failure to report as a mismatch.
type ParsedEntry<C> = Result<(Vec<C>, Vec<Vec<String>>), String>;

fn parse_entry<M: Model>(
    model: &M,
    entry: &TraceEntry,
    players: usize,
) -> HarnessResult<ParsedEntry<M::Control>> {
    let slots = entry.player_commands();
    if entry.commands.is_some() && slots.len() != players {
        return Err(HarnessError::InvalidTrace(format!(
            "turn {} has {} command slot(s), {} needs {players}",
            entry.turn,
            slots.len(),
            model.name()
        )));
    }

    let seats = slots.len();
    let mut controls = Vec::new();
    let mut commands = Vec::with_capacity(seats);
    for (slot, player) in slots.into_iter().zip(PlayerId::all(seats)) {
        let lines: Vec<String> = slot
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        for line in &lines {
            match model.parse_output(line, player) {
                Ok(control) => controls.push(control),
                Err(err) => return Ok(Err(format!("{player}: {err}"))),
            }
        }
        commands.push(lines);
    }
    Ok(Ok((controls, commands)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::shadows::{ShadowsCase, ShadowsOfTheKnight1};
    use crate::model::Catalog;

    fn model() -> ShadowsOfTheKnight1 {
        let case: ShadowsCase = serde_json::from_value(serde_json::json!({
            "width": 10, "height": 10, "max_jumps": 6,
            "start_x": 2, "start_y": 2, "bomb_x": 7, "bomb_y": 4
        }))
        .unwrap();
        ShadowsOfTheKnight1::new(Catalog::new().with("tower", case))
    }

    fn trace(entries: Vec<TraceEntry>) -> Trace {
        Trace {
            test_case: Some("tower".into()),
            cg_trace: entries,
        }
    }

    #[test]
    fn test_matching_trace() {
        let trace = trace(vec![
            TraceEntry::single(1, "5 3").expect("pos", serde_json::json!([5, 3])),
            TraceEntry::single(2, "7 4").expect("pos", serde_json::json!([7, 4])),
        ]);
        let report = replay(&model(), "climb", &trace).unwrap();
        assert!(report.is_ok(), "{:?}", report.mismatches);
        assert_eq!(report.turns(), 2);
        assert_eq!(report.test_case, "tower");
        assert!(matches!(report.result, SimResult::Success(_)));
    }

    #[test]
    fn test_mismatch_is_reported_and_replay_continues() {
        let trace = trace(vec![
            TraceEntry::single(1, "5 3").expect("pos", serde_json::json!([5, 4])),
            TraceEntry::single(2, "6 3").expect("pos", serde_json::json!([6, 3])),
        ]);
        let report = replay(&model(), "climb", &trace).unwrap();
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.first_mismatch().unwrap().turn, 1);
        assert_eq!(report.turns(), 2);
    }

    #[test]
    fn test_unparsable_command_stops_replay() {
        let trace = trace(vec![TraceEntry::single(1, "north"), TraceEntry::single(2, "7 4")]);
        let report = replay(&model(), "climb", &trace).unwrap();
        assert_eq!(report.mismatches.len(), 1);
        assert!(report.mismatches[0].diffs[0].starts_with("P0: cannot parse"));
        assert_eq!(report.turns(), 0);
    }

    #[test]
    fn test_entries_after_game_end_are_flagged() {
        let trace = trace(vec![TraceEntry::single(1, "7 4"), TraceEntry::single(2, "1 1")]);
        let report = replay(&model(), "climb", &trace).unwrap();
        assert_eq!(report.turns(), 1);
        assert_eq!(report.first_mismatch().unwrap().turn, 2);
        assert!(report.mismatches[0].diffs[0].contains("after the game ended"));
    }

    #[test]
    fn test_unknown_test_case() {
        let trace = Trace {
            test_case: None,
            cg_trace: vec![TraceEntry::single(1, "1 1")],
        };
        assert!(matches!(
            replay(&model(), "missing", &trace),
            Err(HarnessError::TestCaseNotFound { .. })
        ));
    }

    #[test]
    fn test_wrong_slot_count_is_invalid() {
        let trace = trace(vec![TraceEntry::multi(1, vec![Some("1 1".into()), None])]);
        assert!(matches!(
            replay(&model(), "climb", &trace),
            Err(HarnessError::InvalidTrace(_))
        ));
    }
}
