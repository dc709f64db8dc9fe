//! Episode 2: the hint compares the last two positions' distance to the
//! bomb.

use super::{Building, Episode, KnightState};
use crate::core::GridPos;

const EPSILON: f64 = 1e-9;

/// Warmer/colder hints.
#[derive(Clone, Copy, Debug, Default)]
pub struct Episode2;

impl Episode for Episode2 {
    const NAME: &'static str = "shadows_of_the_knight_2";
    const DESCRIPTION: &'static str = "Shadows of the Knight Episode 2";

    fn hint(state: &KnightState, building: &Building) -> String {
        match state.prev {
            None => "UNKNOWN".to_string(),
            Some(prev) => heat_hint(prev, state.pos, building.bomb).to_string(),
        }
    }
}

/// `WARMER`, `COLDER` or `SAME` for a jump `prev → current`.
#[must_use]
pub fn heat_hint(prev: GridPos, current: GridPos, bomb: GridPos) -> &'static str {
    let before = prev.distance(bomb);
    let after = current.distance(bomb);
    if after < before - EPSILON {
        "WARMER"
    } else if after > before + EPSILON {
        "COLDER"
    } else {
        "SAME"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlayerId, SimResult};
    use crate::games::shadows::{jump, ShadowsOfTheKnight2};
    use crate::model::Model;

    #[test]
    fn test_heat_hint() {
        let bomb = GridPos::new(5, 5);
        assert_eq!(heat_hint(GridPos::new(0, 0), GridPos::new(3, 3), bomb), "WARMER");
        assert_eq!(heat_hint(GridPos::new(3, 3), GridPos::new(0, 0), bomb), "COLDER");
        assert_eq!(heat_hint(GridPos::new(5, 0), GridPos::new(0, 5), bomb), "SAME");
    }

    #[test]
    fn test_first_turn_unknown_then_warmer() {
        let model = ShadowsOfTheKnight2::default();
        let building = super::super::tests::building();
        let state = KnightState::start(building.start);
        assert_eq!(model.format_turn_input(&state, &building, PlayerId::SOLO), vec!["UNKNOWN"]);

        // (2,3) → (4,3) → (6,4): each jump closer to the bomb at (7,4).
        let (state, result) = jump(&state, GridPos::new(4, 3), &building);
        assert_eq!(result, SimResult::Running);
        assert_eq!(model.format_turn_input(&state, &building, PlayerId::SOLO), vec!["WARMER"]);
        let (state, _) = jump(&state, GridPos::new(6, 4), &building);
        assert_eq!(model.format_turn_input(&state, &building, PlayerId::SOLO), vec!["WARMER"]);
        let (state, _) = jump(&state, GridPos::new(0, 0), &building);
        assert_eq!(model.format_turn_input(&state, &building, PlayerId::SOLO), vec!["COLDER"]);
    }
}
