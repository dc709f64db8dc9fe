//! The protocol loop: spawn programs, feed them turns, simulate.

use std::fmt;
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::config::RunnerConfig;
use super::process::{LineRead, PlayerProcess, ProgramSpec};
use super::trajectory::{Trajectory, TurnRecord};
use crate::core::{HarnessError, HarnessResult, PlayerId, SimResult};
use crate::model::Model;

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Success { reason: Option<String> },
    Failure { reason: String },
    Timeout { turn: u32, player: PlayerId, timeout_ms: u64 },
    ProgramError { turn: u32, player: PlayerId, detail: String },
    InvalidOutput { turn: u32, player: PlayerId, line: String, reason: String },
    MaxTurnsExceeded { max_turns: u32 },
}

impl RunStatus {
    /// Status keyword: `success`, `failure`, `timeout`, `program_error`,
    /// `invalid_output` or `max_turns_exceeded`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RunStatus::Success { .. } => "success",
            RunStatus::Failure { .. } => "failure",
            RunStatus::Timeout { .. } => "timeout",
            RunStatus::ProgramError { .. } => "program_error",
            RunStatus::InvalidOutput { .. } => "invalid_output",
            RunStatus::MaxTurnsExceeded { .. } => "max_turns_exceeded",
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Success { .. })
    }

    fn from_result(result: SimResult) -> Option<RunStatus> {
        match result {
            SimResult::Running => None,
            SimResult::Success(reason) => Some(RunStatus::Success { reason }),
            SimResult::Failure(reason) => Some(RunStatus::Failure { reason }),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success { reason: None } => write!(f, "success"),
            RunStatus::Success { reason: Some(reason) } => write!(f, "success ({reason})"),
            RunStatus::Failure { reason } => write!(f, "failure: {reason}"),
            RunStatus::Timeout {
                turn,
                player,
                timeout_ms,
            } => write!(f, "timeout: turn {turn} ({player}) exceeded {timeout_ms}ms"),
            RunStatus::ProgramError { turn, player, detail } => {
                write!(f, "program_error: turn {turn} ({player}) {detail}")
            }
            RunStatus::InvalidOutput {
                turn,
                player,
                line,
                reason,
            } => write!(f, "invalid_output: turn {turn} ({player}) '{line}': {reason}"),
            RunStatus::MaxTurnsExceeded { .. } => write!(f, "max_turns_exceeded"),
        }
    }
}

/// Everything a run produced.
#[derive(Clone, Debug)]
pub struct RunOutcome<S> {
    pub status: RunStatus,
    /// Turns simulated.
    pub turns: u32,
    pub trajectory: Trajectory<S>,
    /// Last stderr lines of each program.
    pub stderr: Vec<(PlayerId, Vec<String>)>,
}

/// Drives player programs through a test case.
#[derive(Clone, Debug, Default)]
pub struct Runner {
    config: RunnerConfig,
}

/// Lines gathered for one turn, or the reason the turn could not finish.
type Collected<C> = Result<(Vec<C>, Vec<Vec<String>>), RunStatus>;

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Play test case `case` of `model` with one program per player.
    ///
    /// Harness faults (unknown case, wrong number of programs, spawn
    /// failure) are errors; everything the programs do wrong ends up in
    /// the returned status.
    pub fn run<M: Model>(
        &self,
        model: &M,
        case: &str,
        programs: &[ProgramSpec],
    ) -> HarnessResult<RunOutcome<M::State>> {
        let (env, initial) = model.load_test_case(case)?;
        let expected = model.player_count(&env);
        if programs.len() != expected {
            return Err(HarnessError::PlayerCountMismatch {
                model: model.name(),
                expected,
                got: programs.len(),
            });
        }

        let mut processes = programs
            .iter()
            .zip(PlayerId::all(expected))
            .map(|(spec, player)| PlayerProcess::spawn(player, spec, &self.config))
            .collect::<HarnessResult<Vec<_>>>()?;
        info!("{}: running '{case}' with {expected} program(s)", model.name());

        let (status, trajectory) = self.play(model, &env, initial, &mut processes);
        info!("{}: '{case}' finished after {} turn(s): {status}", model.name(), trajectory.len());

        let stderr = processes
            .iter_mut()
            .map(|process| {
                process.shutdown(self.config.shutdown_grace());
                (process.player(), process.stderr_tail())
            })
            .collect();

        Ok(RunOutcome {
            status,
            turns: trajectory.len() as u32,
            trajectory,
            stderr,
        })
    }

    fn play<M: Model>(
        &self,
        model: &M,
        env: &M::Env,
        initial: M::State,
        processes: &mut [PlayerProcess],
    ) -> (RunStatus, Trajectory<M::State>) {
        let mut trajectory = Trajectory::new(initial);

        let init = model.format_init_input(env);
        for process in processes.iter_mut() {
            if let Err(err) = process.send_lines(&init) {
                let status = RunStatus::ProgramError {
                    turn: 0,
                    player: process.player(),
                    detail: format!("cannot write init input: {err}"),
                };
                return (status, trajectory);
            }
        }

        for turn in 1..=self.config.max_turns {
            let state = trajectory.last_state();
            let (controls, commands) = match self.collect_turn(model, env, state, processes, turn) {
                Ok(collected) => collected,
                Err(status) => return (status, trajectory),
            };

            let (next, result) = model.simulate(state, &controls, env);
            debug!("turn {turn}: {} [{result}]", model.describe(&next));
            let status = RunStatus::from_result(result.clone());
            trajectory.push(TurnRecord {
                turn,
                commands,
                state: next,
                result,
            });
            if let Some(status) = status {
                return (status, trajectory);
            }
        }

        let status = RunStatus::MaxTurnsExceeded {
            max_turns: self.config.max_turns,
        };
        (status, trajectory)
    }

    /// Send every player its turn input, then read the required number of
    /// lines from each player in seat order.
    fn collect_turn<M: Model>(
        &self,
        model: &M,
        env: &M::Env,
        state: &M::State,
        processes: &mut [PlayerProcess],
        turn: u32,
    ) -> Collected<M::Control> {
        for process in processes.iter_mut() {
            let player = process.player();
            let input = model.format_turn_input(state, env, player);
            if input.is_empty() {
                continue;
            }
            process.send_lines(&input).map_err(|err| RunStatus::ProgramError {
                turn,
                player,
                detail: format!("cannot write turn input: {err}"),
            })?;
        }

        let timeout = self.config.timeout_for(turn);
        let mut controls = Vec::with_capacity(processes.len());
        let mut commands = Vec::with_capacity(processes.len());
        for process in processes.iter() {
            let player = process.player();
            let needed = model.required_actions(state, player);
            let mut lines = Vec::with_capacity(needed);
            // One budget per player per turn, shared by all of its lines.
            let deadline = Instant::now() + timeout;
            for _ in 0..needed {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let line = match process.read_line(remaining) {
                    LineRead::Line(line) => line,
                    LineRead::Timeout => {
                        warn!(
                            "turn {turn}: {player} gave no answer within {}ms",
                            timeout.as_millis()
                        );
                        return Err(RunStatus::Timeout {
                            turn,
                            player,
                            timeout_ms: self.config.timeout_ms_for(turn),
                        });
                    }
                    LineRead::Closed => {
                        return Err(RunStatus::ProgramError {
                            turn,
                            player,
                            detail: "program closed its output".into(),
                        });
                    }
                };
                if line.trim().is_empty() {
                    return Err(RunStatus::ProgramError {
                        turn,
                        player,
                        detail: "empty output line".into(),
                    });
                }
                let control = model.parse_output(line.trim_end(), player).map_err(|err| {
                    RunStatus::InvalidOutput {
                        turn,
                        player,
                        line: err.line.clone(),
                        reason: err.reason,
                    }
                })?;
                controls.push(control);
                lines.push(line);
            }
            commands.push(lines);
        }
        Ok((controls, commands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_vocabulary() {
        let timeout = RunStatus::Timeout {
            turn: 3,
            player: PlayerId(0),
            timeout_ms: 150,
        };
        assert_eq!(timeout.to_string(), "timeout: turn 3 (P0) exceeded 150ms");
        assert_eq!(timeout.kind(), "timeout");
        assert_eq!(
            RunStatus::Failure {
                reason: "non-flat ground".into()
            }
            .to_string(),
            "failure: non-flat ground"
        );
        assert_eq!(RunStatus::MaxTurnsExceeded { max_turns: 5 }.to_string(), "max_turns_exceeded");
        assert!(RunStatus::Success { reason: None }.is_success());
        assert_eq!(
            RunStatus::InvalidOutput {
                turn: 1,
                player: PlayerId(1),
                line: "x".into(),
                reason: "bad".into()
            }
            .kind(),
            "invalid_output"
        );
    }

    #[test]
    fn test_from_result() {
        assert_eq!(RunStatus::from_result(SimResult::Running), None);
        assert_eq!(
            RunStatus::from_result(SimResult::success_because("max turns reached")),
            Some(RunStatus::Success {
                reason: Some("max turns reached".into())
            })
        );
    }
}
