//! Episode 1: the hint is the compass direction of the bomb.

use super::{Building, Episode, KnightState};
use crate::core::GridPos;

/// Compass hints.
#[derive(Clone, Copy, Debug, Default)]
pub struct Episode1;

impl Episode for Episode1 {
    const NAME: &'static str = "shadows_of_the_knight_1";
    const DESCRIPTION: &'static str = "Shadows of the Knight Episode 1";

    fn hint(state: &KnightState, building: &Building) -> String {
        bomb_direction(state.pos, building.bomb).to_string()
    }
}

/// One of `U UR R DR D DL L UL`. `y` grows downward, so up means a
/// smaller `y`.
#[must_use]
pub fn bomb_direction(from: GridPos, bomb: GridPos) -> &'static str {
    use std::cmp::Ordering::{Equal, Greater, Less};

    match ((bomb.y - from.y).cmp(&0), (bomb.x - from.x).cmp(&0)) {
        (Less, Less) => "UL",
        (Less, Equal) => "U",
        (Less, Greater) => "UR",
        (Equal, Greater) => "R",
        (Greater, Greater) => "DR",
        (Greater, Equal) => "D",
        (Greater, Less) => "DL",
        (Equal, Less) => "L",
        // Standing on the bomb never happens mid-game.
        (Equal, Equal) => "U",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::shadows::ShadowsOfTheKnight1;
    use crate::model::Model;
    use crate::core::PlayerId;

    #[test]
    fn test_all_octants() {
        let c = GridPos::new(5, 5);
        assert_eq!(bomb_direction(c, GridPos::new(5, 0)), "U");
        assert_eq!(bomb_direction(c, GridPos::new(9, 1)), "UR");
        assert_eq!(bomb_direction(c, GridPos::new(9, 5)), "R");
        assert_eq!(bomb_direction(c, GridPos::new(9, 9)), "DR");
        assert_eq!(bomb_direction(c, GridPos::new(5, 9)), "D");
        assert_eq!(bomb_direction(c, GridPos::new(0, 9)), "DL");
        assert_eq!(bomb_direction(c, GridPos::new(0, 5)), "L");
        assert_eq!(bomb_direction(c, GridPos::new(0, 0)), "UL");
    }

    #[test]
    fn test_turn_input_points_at_bomb() {
        let model = ShadowsOfTheKnight1::default();
        let building = super::super::tests::building();
        let state = KnightState::start(building.start);
        assert_eq!(model.format_turn_input(&state, &building, PlayerId::SOLO), vec!["DR"]);
        assert_eq!(
            model.format_init_input(&building),
            vec!["10 10".to_string(), "6".to_string(), "2 3".to_string()]
        );
    }
}
