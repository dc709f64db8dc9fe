//! Mars Lander: continuous 2D lander physics over a polyline surface.
//!
//! The lander is `flying` until it touches the ground (`landed` or
//! `crashed`) or leaves the 7000×3000 zone. Positions and speeds are
//! integrated in `f64` for the whole run; the wire protocol only ever sees
//! the rounded values. The precise values travel inside [`LanderState`], so
//! `simulate` stays a pure function even though the visible state alone
//! would not be enough to reproduce the next turn.

use serde::{Deserialize, Serialize};

use crate::core::error::parse_int;
use crate::core::{HarnessError, HarnessResult, ParseError, PlayerId, SimResult};
use crate::model::{Catalog, CatalogEntry, Model};
use crate::replay::TraceEntry;

pub const GRAVITY: f64 = 3.711;
pub const MAX_X: i32 = 7000;
pub const MAX_Y: i32 = 3000;
pub const MAX_ANGLE_CHANGE: i32 = 15;
pub const MAX_POWER_CHANGE: i32 = 1;
pub const MAX_ANGLE: i32 = 90;
pub const MAX_POWER: i32 = 4;
pub const MAX_LANDING_V_SPEED: i32 = 40;
pub const MAX_LANDING_H_SPEED: i32 = 20;

/// Minimum width of a flat segment that counts as a landing zone.
const MIN_ZONE_WIDTH: f64 = 1000.0;

/// Round half away from zero: `10.5 → 11`, `-10.5 → -11`.
///
/// Written with `floor`/`ceil` so that it matches the reference engine
/// bit for bit, including values just below a half.
#[must_use]
pub fn round_half_away(value: f64) -> i32 {
    if value >= 0.0 {
        (value + 0.5).floor() as i32
    } else {
        (value - 0.5).ceil() as i32
    }
}

/// Flat stretch of ground where touching down can succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingZone {
    pub x1: i32,
    pub x2: i32,
    pub y: i32,
}

impl LandingZone {
    #[must_use]
    pub fn contains_x(&self, x: f64) -> bool {
        f64::from(self.x1) <= x && x <= f64::from(self.x2)
    }

    /// Find the first horizontal segment at least 1000 m wide.
    #[must_use]
    pub fn detect(points: &[(f64, f64)]) -> Option<LandingZone> {
        points.windows(2).find_map(|pair| {
            let ((ax, ay), (bx, by)) = (pair[0], pair[1]);
            (ay == by && (bx - ax).abs() >= MIN_ZONE_WIDTH).then(|| LandingZone {
                x1: ax.min(bx) as i32,
                x2: ax.max(bx) as i32,
                y: ay as i32,
            })
        })
    }
}

/// Static ground geometry of a test case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub points: Vec<(f64, f64)>,
    pub landing_zone: LandingZone,
}

impl Surface {
    /// Ground height at `x`. Inside the landing zone this is the zone floor,
    /// which matters for cave maps whose polyline also contains a ceiling.
    #[must_use]
    pub fn height_at(&self, x: f64) -> f64 {
        if self.landing_zone.contains_x(x) {
            return f64::from(self.landing_zone.y);
        }
        for pair in self.points.windows(2) {
            let ((ax, ay), (bx, by)) = (pair[0], pair[1]);
            if ax <= x && x <= bx {
                let t = (x - ax) / (bx - ax);
                return ay + t * (by - ay);
            }
        }
        0.0
    }

    /// First surface segment crossed by the path `from → to`, as the
    /// intersection point.
    #[must_use]
    pub fn first_crossing(&self, from: (f64, f64), to: (f64, f64)) -> Option<(f64, f64)> {
        self.points
            .windows(2)
            .find_map(|pair| segment_intersection(from, to, pair[0], pair[1]))
    }
}

/// Standard parametric intersection of segments `p1→p2` and `p3→p4`.
#[must_use]
pub fn segment_intersection(
    p1: (f64, f64),
    p2: (f64, f64),
    p3: (f64, f64),
    p4: (f64, f64),
) -> Option<(f64, f64)> {
    let ((x1, y1), (x2, y2), (x3, y3), (x4, y4)) = (p1, p2, p3, p4);
    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < 1e-10 {
        return None;
    }
    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denom;
    let u = -((x1 - x2) * (y1 - y3) - (y1 - y2) * (x1 - x3)) / denom;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u))
        .then(|| (x1 + t * (x2 - x1), y1 + t * (y2 - y1)))
}

/// Unrounded position and speed carried between turns.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub x: f64,
    pub y: f64,
    pub h_speed: f64,
    pub v_speed: f64,
}

/// Lander snapshot: the integer values the program sees plus the precise
/// kinematics they were rounded from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LanderState {
    pub x: i32,
    pub y: i32,
    pub h_speed: i32,
    pub v_speed: i32,
    pub fuel: u32,
    pub rotate: i32,
    pub power: i32,
    pub precise: Kinematics,
}

impl LanderState {
    /// A state whose precise kinematics equal its integer values.
    #[must_use]
    pub fn new(
        x: i32,
        y: i32,
        h_speed: i32,
        v_speed: i32,
        fuel: u32,
        rotate: i32,
        power: i32,
    ) -> Self {
        Self {
            x,
            y,
            h_speed,
            v_speed,
            fuel,
            rotate,
            power,
            precise: Kinematics {
                x: f64::from(x),
                y: f64::from(y),
                h_speed: f64::from(h_speed),
                v_speed: f64::from(v_speed),
            },
        }
    }

    fn from_precise(precise: Kinematics, fuel: u32, rotate: i32, power: i32) -> Self {
        Self {
            x: round_half_away(precise.x),
            y: round_half_away(precise.y),
            h_speed: round_half_away(precise.h_speed),
            v_speed: round_half_away(precise.v_speed),
            fuel,
            rotate,
            power,
            precise,
        }
    }

    /// Landing verdict for a touchdown inside the zone.
    fn landing_fault(&self) -> Option<String> {
        if self.rotate != 0 {
            Some(format!("angle not vertical ({} deg)", self.rotate))
        } else if self.v_speed.abs() > MAX_LANDING_V_SPEED {
            Some(format!("vertical speed too high ({} m/s)", self.v_speed))
        } else if self.h_speed.abs() > MAX_LANDING_H_SPEED {
            Some(format!("horizontal speed too high ({} m/s)", self.h_speed))
        } else {
            None
        }
    }
}

/// Requested rotation and power for one turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thrust {
    pub rotate: i32,
    pub power: i32,
}

impl Thrust {
    /// Clamp a request against the previously committed values, then
    /// against the absolute ranges.
    #[must_use]
    pub fn constrained(self, current_rotate: i32, current_power: i32) -> Thrust {
        let rotate = self
            .rotate
            .clamp(current_rotate - MAX_ANGLE_CHANGE, current_rotate + MAX_ANGLE_CHANGE);
        let power = self
            .power
            .clamp(current_power - MAX_POWER_CHANGE, current_power + MAX_POWER_CHANGE);
        Thrust {
            rotate: rotate.clamp(-MAX_ANGLE, MAX_ANGLE),
            power: power.clamp(0, MAX_POWER),
        }
    }
}

/// One turn of lander physics.
#[must_use]
pub fn step(state: &LanderState, requested: Thrust, surface: &Surface) -> (LanderState, SimResult) {
    let control = requested.constrained(state.rotate, state.power);
    let thrust = control.power.min(state.fuel as i32).max(0);

    let angle = f64::from(control.rotate).to_radians();
    let accel_h = -angle.sin() * f64::from(thrust);
    let accel_v = angle.cos() * f64::from(thrust) - GRAVITY;

    let before = state.precise;
    let precise = Kinematics {
        x: before.x + before.h_speed + 0.5 * accel_h,
        y: before.y + before.v_speed + 0.5 * accel_v,
        h_speed: before.h_speed + accel_h,
        v_speed: before.v_speed + accel_v,
    };
    let fuel = state.fuel.saturating_sub(thrust as u32);
    let next = LanderState::from_precise(precise, fuel, control.rotate, control.power);

    // The path starts from the truncated previous position.
    let from = (before.x.trunc(), before.y.trunc());
    let to = (f64::from(next.x), f64::from(next.y));
    let crossing = surface.first_crossing(from, to);
    let below = to.1 <= surface.height_at(to.0);

    if crossing.is_some() || below {
        let touch_x = crossing.map_or(to.0, |(x, _)| x);
        let result = if surface.landing_zone.contains_x(touch_x) {
            match next.landing_fault() {
                None => SimResult::success(),
                Some(fault) => SimResult::failure(format!("landing zone: {fault}")),
            }
        } else {
            SimResult::failure("non-flat ground")
        };
        return (next, result);
    }

    if next.x < 0 || next.x >= MAX_X {
        return (next, SimResult::failure("horizontal bounds"));
    }
    if next.y < 0 || next.y >= MAX_Y {
        return (next, SimResult::failure("vertical bounds"));
    }
    (next, SimResult::Running)
}

/// Initial lander values as stored in fixtures.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanderStart {
    pub x: i32,
    pub y: i32,
    pub h_speed: i32,
    pub v_speed: i32,
    pub fuel: u32,
    pub rotate: i32,
    pub power: i32,
}

/// Test-case fixture.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarsCase {
    #[serde(default)]
    pub name: Option<String>,
    pub surface: Vec<(f64, f64)>,
    #[serde(default)]
    pub landing_zone: Option<LandingZone>,
    pub initial: LanderStart,
}

impl CatalogEntry for MarsCase {
    fn title(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Mars Lander model.
#[derive(Clone, Debug, Default)]
pub struct MarsLander {
    cases: Catalog<MarsCase>,
}

impl MarsLander {
    pub const NAME: &'static str = "mars_lander";

    #[must_use]
    pub fn new(cases: Catalog<MarsCase>) -> Self {
        Self { cases }
    }
}

impl Model for MarsLander {
    type Env = Surface;
    type State = LanderState;
    type Control = Thrust;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Mars Lander Episode 3"
    }

    fn test_cases(&self) -> Vec<(String, String)> {
        self.cases.listing()
    }

    fn load_test_case(&self, name: &str) -> HarnessResult<(Surface, LanderState)> {
        let case = self.cases.get(name).ok_or_else(|| HarnessError::TestCaseNotFound {
            model: Self::NAME,
            name: name.to_string(),
        })?;
        let landing_zone = case
            .landing_zone
            .or_else(|| LandingZone::detect(&case.surface))
            .ok_or_else(|| HarnessError::InvalidTestCase {
                name: name.to_string(),
                reason: "surface has no flat landing zone".into(),
            })?;

        let init = &case.initial;
        let state = LanderState::new(
            init.x,
            init.y,
            init.h_speed,
            init.v_speed,
            init.fuel,
            init.rotate,
            init.power,
        );
        let surface = Surface {
            points: case.surface.clone(),
            landing_zone,
        };
        Ok((surface, state))
    }

    fn format_init_input(&self, env: &Surface) -> Vec<String> {
        let mut lines = Vec::with_capacity(env.points.len() + 1);
        lines.push(env.points.len().to_string());
        lines.extend(env.points.iter().map(|(x, y)| format!("{} {}", *x as i64, *y as i64)));
        lines
    }

    fn format_turn_input(&self, s: &LanderState, _env: &Surface, _player: PlayerId) -> Vec<String> {
        vec![format!(
            "{} {} {} {} {} {} {}",
            s.x, s.y, s.h_speed, s.v_speed, s.fuel, s.rotate, s.power
        )]
    }

    fn parse_output(&self, line: &str, _player: PlayerId) -> Result<Thrust, ParseError> {
        let mut tokens = line.split_whitespace();
        let rotate = parse_int(line, tokens.next(), "rotate")?;
        let power = parse_int(line, tokens.next(), "power")?;
        Ok(Thrust { rotate, power })
    }

    fn simulate(
        &self,
        state: &LanderState,
        controls: &[Thrust],
        env: &Surface,
    ) -> (LanderState, SimResult) {
        // No command holds the current attitude.
        let requested = controls.first().copied().unwrap_or(Thrust {
            rotate: state.rotate,
            power: state.power,
        });
        step(state, requested, env)
    }

    fn compare_state(&self, state: &LanderState, expected: &TraceEntry) -> Vec<String> {
        let actual = [
            ("x", i64::from(state.x)),
            ("y", i64::from(state.y)),
            ("hSpeed", i64::from(state.h_speed)),
            ("vSpeed", i64::from(state.v_speed)),
            ("fuel", i64::from(state.fuel)),
            ("rotate", i64::from(state.rotate)),
            ("power", i64::from(state.power)),
        ];
        actual
            .iter()
            .filter_map(|&(field, value)| {
                let want = expected.int_field(field)?;
                (want != value).then(|| format!("{field}: got {value}, expected {want}"))
            })
            .collect()
    }

    fn describe(&self, s: &LanderState) -> String {
        format!(
            "pos=({}, {}), speed=({}, {}), angle={}, power={}, fuel={}",
            s.x, s.y, s.h_speed, s.v_speed, s.rotate, s.power, s.fuel
        )
    }
}
