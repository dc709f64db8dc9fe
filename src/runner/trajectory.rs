//! Turn-by-turn record of a run or a replay.
//!
//! A trajectory captures:
//! - The state before the first turn
//! - For every turn, the raw command lines and the state they produced
//! - The step result of every turn

use serde::{Deserialize, Serialize};

use crate::core::SimResult;

/// One simulated turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnRecord<S> {
    /// Turn number, starting at 1.
    pub turn: u32,

    /// Raw output lines per player, in player order.
    pub commands: Vec<Vec<String>>,

    /// State after the turn.
    pub state: S,

    pub result: SimResult,
}

/// Initial state plus every turn played from it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trajectory<S> {
    pub initial: S,
    pub turns: Vec<TurnRecord<S>>,
}

impl<S> Trajectory<S> {
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            turns: Vec::new(),
        }
    }

    /// Record a turn.
    pub fn push(&mut self, record: TurnRecord<S>) {
        self.turns.push(record);
    }

    /// Number of turns played.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Latest state: the last turn's, or the initial one.
    pub fn last_state(&self) -> &S {
        self.turns.last().map_or(&self.initial, |record| &record.state)
    }

    /// Up to `n` most recent turns, oldest first.
    pub fn last(&self, n: usize) -> &[TurnRecord<S>] {
        &self.turns[self.turns.len().saturating_sub(n)..]
    }

    /// All states in order, the initial one included.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        std::iter::once(&self.initial).chain(self.turns.iter().map(|record| &record.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(turn: u32, state: i32) -> TurnRecord<i32> {
        TurnRecord {
            turn,
            commands: vec![vec![format!("MOVE {state}")]],
            state,
            result: SimResult::Running,
        }
    }

    #[test]
    fn test_empty_trajectory() {
        let trajectory = Trajectory::new(7);
        assert!(trajectory.is_empty());
        assert_eq!(*trajectory.last_state(), 7);
        assert!(trajectory.last(5).is_empty());
    }

    #[test]
    fn test_last_turns() {
        let mut trajectory = Trajectory::new(0);
        for turn in 1..=4 {
            trajectory.push(record(turn, turn as i32 * 10));
        }
        assert_eq!(trajectory.len(), 4);
        assert_eq!(*trajectory.last_state(), 40);
        let tail: Vec<u32> = trajectory.last(2).iter().map(|r| r.turn).collect();
        assert_eq!(tail, vec![3, 4]);
        assert_eq!(trajectory.last(10).len(), 4);
        assert_eq!(trajectory.states().copied().collect::<Vec<_>>(), vec![0, 10, 20, 30, 40]);
    }
}
