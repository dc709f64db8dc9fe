//! Shadows of the Knight: Batman jumps across a building looking for a bomb.
//!
//! Both episodes share the board, the jump rules and the termination logic;
//! they differ only in the hint sent at the start of each turn. The shared
//! part lives in [`ShadowsOfTheKnight`], generic over an [`Episode`].

pub mod episode1;
pub mod episode2;

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::core::error::parse_int;
use crate::core::{GridPos, HarnessError, HarnessResult, ParseError, PlayerId, SimResult};
use crate::model::{Catalog, CatalogEntry, Model};
use crate::replay::TraceEntry;

pub use episode1::{bomb_direction, Episode1};
pub use episode2::{heat_hint, Episode2};

/// Episode 1 model: compass hints.
pub type ShadowsOfTheKnight1 = ShadowsOfTheKnight<Episode1>;
/// Episode 2 model: warmer/colder hints.
pub type ShadowsOfTheKnight2 = ShadowsOfTheKnight<Episode2>;

/// The per-episode part of the game.
pub trait Episode {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    /// Hint line sent before the jump.
    fn hint(state: &KnightState, building: &Building) -> String;
}

/// Building dimensions, jump budget and the hidden bomb.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Building {
    pub width: i32,
    pub height: i32,
    pub max_jumps: u32,
    pub start: GridPos,
    pub bomb: GridPos,
}

/// Batman's position, where he jumped from, and jumps made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KnightState {
    pub pos: GridPos,
    pub prev: Option<GridPos>,
    pub turn: u32,
}

impl KnightState {
    #[must_use]
    pub fn start(pos: GridPos) -> Self {
        Self {
            pos,
            prev: None,
            turn: 0,
        }
    }
}

/// Apply one jump to `target`.
///
/// An out-of-bounds target fails and leaves the state as it was.
#[must_use]
pub fn jump(state: &KnightState, target: GridPos, building: &Building) -> (KnightState, SimResult) {
    if target.x < 0 || target.x >= building.width {
        return (
            state.clone(),
            SimResult::failure(format!("x={} out of bounds [0, {})", target.x, building.width)),
        );
    }
    if target.y < 0 || target.y >= building.height {
        return (
            state.clone(),
            SimResult::failure(format!("y={} out of bounds [0, {})", target.y, building.height)),
        );
    }

    let next = KnightState {
        pos: target,
        prev: Some(state.pos),
        turn: state.turn + 1,
    };
    let result = if target == building.bomb {
        SimResult::success()
    } else if next.turn >= building.max_jumps {
        SimResult::failure(format!("ran out of jumps ({}/{})", next.turn, building.max_jumps))
    } else {
        SimResult::Running
    };
    (next, result)
}

/// Test-case fixture. Cases recorded from a failed run may lack the bomb.
#[derive(Clone, Debug, Deserialize)]
pub struct ShadowsCase {
    #[serde(default)]
    pub name: Option<String>,
    pub width: i32,
    pub height: i32,
    pub max_jumps: u32,
    pub start_x: i32,
    pub start_y: i32,
    #[serde(default)]
    pub bomb_x: Option<i32>,
    #[serde(default)]
    pub bomb_y: Option<i32>,
}

impl CatalogEntry for ShadowsCase {
    fn title(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Shadows of the Knight model for episode `E`.
#[derive(Clone, Debug)]
pub struct ShadowsOfTheKnight<E> {
    cases: Catalog<ShadowsCase>,
    _episode: PhantomData<E>,
}

impl<E> Default for ShadowsOfTheKnight<E> {
    fn default() -> Self {
        Self::new(Catalog::default())
    }
}

impl<E> ShadowsOfTheKnight<E> {
    #[must_use]
    pub fn new(cases: Catalog<ShadowsCase>) -> Self {
        Self {
            cases,
            _episode: PhantomData,
        }
    }
}

impl<E: Episode> Model for ShadowsOfTheKnight<E> {
    type Env = Building;
    type State = KnightState;
    type Control = GridPos;

    fn name(&self) -> &'static str {
        E::NAME
    }

    fn description(&self) -> &'static str {
        E::DESCRIPTION
    }

    fn test_cases(&self) -> Vec<(String, String)> {
        self.cases.listing()
    }

    fn load_test_case(&self, name: &str) -> HarnessResult<(Building, KnightState)> {
        let case = self.cases.get(name).ok_or_else(|| HarnessError::TestCaseNotFound {
            model: E::NAME,
            name: name.to_string(),
        })?;
        let (Some(bomb_x), Some(bomb_y)) = (case.bomb_x, case.bomb_y) else {
            return Err(HarnessError::InvalidTestCase {
                name: name.to_string(),
                reason: "bomb position unknown".into(),
            });
        };

        let start = GridPos::new(case.start_x, case.start_y);
        let building = Building {
            width: case.width,
            height: case.height,
            max_jumps: case.max_jumps,
            start,
            bomb: GridPos::new(bomb_x, bomb_y),
        };
        Ok((building, KnightState::start(start)))
    }

    fn format_init_input(&self, env: &Building) -> Vec<String> {
        vec![
            format!("{} {}", env.width, env.height),
            env.max_jumps.to_string(),
            format!("{} {}", env.start.x, env.start.y),
        ]
    }

    fn format_turn_input(
        &self,
        state: &KnightState,
        env: &Building,
        _player: PlayerId,
    ) -> Vec<String> {
        vec![E::hint(state, env)]
    }

    fn parse_output(&self, line: &str, _player: PlayerId) -> Result<GridPos, ParseError> {
        let mut tokens = line.split_whitespace();
        let x = parse_int(line, tokens.next(), "x")?;
        let y = parse_int(line, tokens.next(), "y")?;
        if tokens.next().is_some() {
            return Err(ParseError::new(line, "expected 'X Y'"));
        }
        Ok(GridPos::new(x, y))
    }

    fn simulate(
        &self,
        state: &KnightState,
        controls: &[GridPos],
        env: &Building,
    ) -> (KnightState, SimResult) {
        match controls.first() {
            Some(&target) => jump(state, target, env),
            None => (state.clone(), SimResult::failure("no jump given")),
        }
    }

    fn compare_state(&self, state: &KnightState, expected: &TraceEntry) -> Vec<String> {
        let Some(want) = expected.int_list("pos") else {
            return Vec::new();
        };
        let got = vec![i64::from(state.pos.x), i64::from(state.pos.y)];
        if got == want {
            Vec::new()
        } else {
            vec![format!("pos: got {got:?}, expected {want:?}")]
        }
    }

    fn describe(&self, state: &KnightState) -> String {
        format!("pos=({}, {}), turn={}", state.pos.x, state.pos.y, state.turn)
    }
}
