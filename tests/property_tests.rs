//! Property tests for the numeric rules shared by every run.

use proptest::prelude::*;

use puzzle_harness::games::cellularena::Proteins;
use puzzle_harness::games::mars_lander::{round_half_away, Thrust, MAX_ANGLE, MAX_POWER};
use puzzle_harness::games::the_fall::{rotate, Turn};

proptest! {
    #[test]
    fn rounding_is_symmetric(value in -1.0e6f64..1.0e6) {
        prop_assert_eq!(round_half_away(-value), -round_half_away(value));
    }

    #[test]
    fn rounding_stays_within_half(value in -1.0e6f64..1.0e6) {
        let rounded = f64::from(round_half_away(value));
        prop_assert!((rounded - value).abs() <= 0.5 + 1e-9);
    }

    #[test]
    fn exact_halves_round_away_from_zero(n in -100_000i32..100_000) {
        let half = f64::from(n) + 0.5;
        let expected = if half > 0.0 { n + 1 } else { n };
        prop_assert_eq!(round_half_away(half), expected);
    }

    #[test]
    fn thrust_changes_are_bounded(
        rotate in -90i32..=90,
        power in 0i32..=4,
        want_rotate in -500i32..500,
        want_power in -10i32..10,
    ) {
        let next = Thrust { rotate: want_rotate, power: want_power }.constrained(rotate, power);
        prop_assert!((next.rotate - rotate).abs() <= 15);
        prop_assert!((next.power - power).abs() <= 1);
        prop_assert!((-MAX_ANGLE..=MAX_ANGLE).contains(&next.rotate));
        prop_assert!((0..=MAX_POWER).contains(&next.power));
    }

    #[test]
    fn debit_never_goes_negative(
        stock in prop::array::uniform4(0u32..20),
        cost in prop::array::uniform4(0u32..5),
    ) {
        let stock = Proteins(stock);
        let cost = Proteins(cost);
        match stock.debit(&cost) {
            Some(left) => {
                prop_assert!(stock.covers(&cost));
                prop_assert_eq!(left + cost, stock);
            }
            None => {
                prop_assert!(!stock.covers(&cost));
                prop_assert!(stock.shortfall(&cost).is_some());
            }
        }
    }

    #[test]
    fn left_undoes_right(room in 0u8..14) {
        prop_assert_eq!(rotate(rotate(room, Turn::Right), Turn::Left), room);
    }

    #[test]
    fn four_quarter_turns_are_identity(room in 0u8..14) {
        let mut turned = room;
        for _ in 0..4 {
            turned = rotate(turned, Turn::Right);
        }
        prop_assert_eq!(turned, room);
    }
}
