//! The Fall: Indy falls through a grid of rotatable rooms while rocks chase
//! him.
//!
//! Each room type routes an entry side (top, left, right) to a hop into a
//! neighbouring room, or blocks it. Every turn the player may rotate one
//! room; then Indy and all rocks hop once against the rotated grid.

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::error::parse_int;
use crate::core::{GridPos, HarnessError, HarnessResult, ParseError, PlayerId, SimResult};
use crate::model::{Catalog, CatalogEntry, Model};
use crate::replay::TraceEntry;

/// Side through which a token enters a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Entry {
    Top,
    Left,
    Right,
}

impl Entry {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Entry::Top => "TOP",
            Entry::Left => "LEFT",
            Entry::Right => "RIGHT",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Room-to-room move: offset plus the entry side in the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub dx: i32,
    pub dy: i32,
    pub entry: Entry,
}

const DOWN: Option<Hop> = Some(Hop { dx: 0, dy: 1, entry: Entry::Top });
const TO_LEFT: Option<Hop> = Some(Hop { dx: -1, dy: 0, entry: Entry::Right });
const TO_RIGHT: Option<Hop> = Some(Hop { dx: 1, dy: 0, entry: Entry::Left });
const BLOCKED: Option<Hop> = None;

/// Routing per room type, indexed `[type][TOP, LEFT, RIGHT]`.
const ROOMS: [[Option<Hop>; 3]; 14] = [
    [BLOCKED, BLOCKED, BLOCKED],
    [DOWN, DOWN, DOWN],
    [BLOCKED, TO_RIGHT, TO_LEFT],
    [DOWN, BLOCKED, BLOCKED],
    [TO_LEFT, BLOCKED, DOWN],
    [TO_RIGHT, DOWN, BLOCKED],
    [BLOCKED, TO_RIGHT, TO_LEFT],
    [DOWN, BLOCKED, DOWN],
    [DOWN, DOWN, DOWN],
    [DOWN, DOWN, BLOCKED],
    [TO_LEFT, BLOCKED, BLOCKED],
    [TO_RIGHT, BLOCKED, BLOCKED],
    [BLOCKED, BLOCKED, DOWN],
    [BLOCKED, DOWN, BLOCKED],
];

/// Exit of `room` for a token entering through `entry`. Unknown types block.
#[must_use]
pub fn route(room: u8, entry: Entry) -> Option<Hop> {
    ROOMS.get(usize::from(room)).and_then(|exits| exits[entry.index()])
}

/// Direction of a rotation command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Turn {
    Left,
    Right,
}

/// Room type after a quarter turn.
#[must_use]
pub fn rotate(room: u8, turn: Turn) -> u8 {
    match (turn, room) {
        (_, 2) => 3,
        (_, 3) => 2,
        (_, 4) => 5,
        (_, 5) => 4,
        (Turn::Right, 6..=8 | 10..=12) => room + 1,
        (Turn::Right, 9) => 6,
        (Turn::Right, 13) => 10,
        (Turn::Left, 7..=9 | 11..=13) => room - 1,
        (Turn::Left, 6) => 9,
        (Turn::Left, 10) => 13,
        _ => room,
    }
}

/// Indy or a rock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token {
    pub x: i32,
    pub y: i32,
    pub entry: Entry,
}

impl Token {
    #[must_use]
    pub fn pos(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }
}

/// A rock entering the grid on a given turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledRock {
    pub turn: u32,
    pub x: i32,
    pub y: i32,
    pub entry: Entry,
}

/// Static part of a level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tunnel {
    pub width: i32,
    pub height: i32,
    pub exit_x: i32,
    /// Room types at load time, row-major.
    pub initial_rooms: Vec<u8>,
    pub locked: Vec<bool>,
    pub scheduled_rocks: Vec<ScheduledRock>,
}

impl Tunnel {
    fn cell(&self, pos: GridPos) -> Option<usize> {
        pos.in_bounds(self.width, self.height).then(|| pos.index(self.width))
    }
}

/// Current rooms, Indy, and rocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FallState {
    pub rooms: im::Vector<u8>,
    pub indy: Token,
    pub rocks: SmallVec<[Token; 4]>,
    pub turn: u32,
}

/// A player command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FallCommand {
    Wait,
    Rotate { pos: GridPos, turn: Turn },
}

/// One hop of `token` through the grid. `None` if blocked or leaving.
#[must_use]
pub fn advance(token: Token, rooms: &im::Vector<u8>, tunnel: &Tunnel) -> Option<Token> {
    let here = tunnel.cell(token.pos())?;
    let hop = route(rooms[here], token.entry)?;
    let next = Token {
        x: token.x + hop.dx,
        y: token.y + hop.dy,
        entry: hop.entry,
    };
    let there = tunnel.cell(next.pos())?;
    route(rooms[there], next.entry).map(|_| next)
}

fn rotation_fault(state: &FallState, tunnel: &Tunnel, pos: GridPos) -> Option<String> {
    let Some(cell) = tunnel.cell(pos) else {
        return Some(format!("position {pos} out of bounds"));
    };
    if tunnel.locked[cell] {
        Some(format!("room {pos} is locked"))
    } else if state.indy.pos() == pos {
        Some(format!("room {pos} holds Indy"))
    } else if state.rocks.iter().any(|rock| rock.pos() == pos) {
        Some(format!("room {pos} holds a rock"))
    } else {
        None
    }
}

/// One turn: optional rotation, then every token hops once.
#[must_use]
pub fn step(state: &FallState, command: FallCommand, tunnel: &Tunnel) -> (FallState, SimResult) {
    let mut rooms = state.rooms.clone();
    if let FallCommand::Rotate { pos, turn } = command {
        match rotation_fault(state, tunnel, pos) {
            Some(fault) => debug!("the_fall: rotation skipped, {fault}"),
            None => {
                let cell = pos.index(tunnel.width);
                let room = rooms[cell];
                rooms[cell] = rotate(room, turn);
            }
        }
    }

    let Some(indy) = advance(state.indy, &rooms, tunnel) else {
        return (
            state.clone(),
            SimResult::failure(format!("Indy blocked at {}", state.indy.pos())),
        );
    };
    let turn = state.turn + 1;

    if indy.y == tunnel.height - 1 {
        let cell = indy.pos().index(tunnel.width);
        let leaves = route(rooms[cell], indy.entry)
            .is_some_and(|hop| {
                indy.y + hop.dy >= tunnel.height && indy.x + hop.dx == tunnel.exit_x
            });
        if leaves {
            let next = FallState {
                rooms,
                indy,
                rocks: SmallVec::new(),
                turn,
            };
            return (next, SimResult::success());
        }
    }

    let mut rocks: SmallVec<[Token; 4]> = state
        .rocks
        .iter()
        .filter_map(|&rock| advance(rock, &rooms, tunnel))
        .collect();
    rocks.extend(
        tunnel
            .scheduled_rocks
            .iter()
            .filter(|scheduled| scheduled.turn == turn)
            .map(|s| Token {
                x: s.x,
                y: s.y,
                entry: s.entry,
            }),
    );

    // Rocks sharing a cell destroy each other.
    let crowded: SmallVec<[GridPos; 4]> = rocks
        .iter()
        .enumerate()
        .filter(|(i, rock)| rocks[..*i].iter().any(|other| other.pos() == rock.pos()))
        .map(|(_, rock)| rock.pos())
        .collect();
    rocks.retain(|rock| !crowded.contains(&rock.pos()));

    let hit = rocks.iter().find(|rock| rock.pos() == indy.pos()).map(Token::pos);
    let next = FallState { rooms, indy, rocks, turn };
    match hit {
        Some(pos) => (next, SimResult::failure(format!("Indy hit rock at {pos}"))),
        None => (next, SimResult::Running),
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FallCase {
    #[serde(default)]
    pub name: Option<String>,
    pub width: i32,
    pub height: i32,
    pub exit_x: i32,
    /// Room types; negative values are locked rooms.
    pub grid: Vec<Vec<i32>>,
    #[serde(default)]
    pub indy: Option<Token>,
    #[serde(default)]
    pub rocks: Vec<Token>,
    #[serde(default)]
    pub scheduled_rocks: Vec<ScheduledRock>,
}

impl CatalogEntry for FallCase {
    fn title(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// The Fall Episode 3 model.
#[derive(Clone, Debug, Default)]
pub struct TheFall {
    cases: Catalog<FallCase>,
}

impl TheFall {
    pub const NAME: &'static str = "the_fall";

    #[must_use]
    pub fn new(cases: Catalog<FallCase>) -> Self {
        Self { cases }
    }
}

impl Model for TheFall {
    type Env = Tunnel;
    type State = FallState;
    type Control = FallCommand;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "The Fall Episode 3"
    }

    fn test_cases(&self) -> Vec<(String, String)> {
        self.cases.listing()
    }

    fn load_test_case(&self, name: &str) -> HarnessResult<(Tunnel, FallState)> {
        let case = self.cases.get(name).ok_or_else(|| HarnessError::TestCaseNotFound {
            model: Self::NAME,
            name: name.to_string(),
        })?;
        let invalid = |reason: String| HarnessError::InvalidTestCase {
            name: name.to_string(),
            reason,
        };

        if case.grid.len() != case.height as usize
            || case.grid.iter().any(|row| row.len() != case.width as usize)
        {
            return Err(invalid(format!("grid is not {}x{}", case.width, case.height)));
        }
        let mut initial_rooms = Vec::with_capacity(case.grid.len() * case.width as usize);
        for &value in case.grid.iter().flatten() {
            let room = u8::try_from(value.unsigned_abs())
                .ok()
                .filter(|&room| usize::from(room) < ROOMS.len())
                .ok_or_else(|| invalid(format!("unknown room type {value}")))?;
            initial_rooms.push(room);
        }
        let locked = case.grid.iter().flatten().map(|&value| value < 0).collect();

        let tunnel = Tunnel {
            width: case.width,
            height: case.height,
            exit_x: case.exit_x,
            initial_rooms,
            locked,
            scheduled_rocks: case.scheduled_rocks.clone(),
        };
        let state = FallState {
            rooms: tunnel.initial_rooms.iter().copied().collect(),
            indy: case.indy.unwrap_or(Token {
                x: 0,
                y: 0,
                entry: Entry::Top,
            }),
            rocks: case.rocks.iter().copied().collect(),
            turn: 0,
        };
        Ok((tunnel, state))
    }

    fn format_init_input(&self, env: &Tunnel) -> Vec<String> {
        let mut lines = vec![format!("{} {}", env.width, env.height)];
        let rows = env.initial_rooms.chunks(env.width.max(1) as usize);
        let locks = env.locked.chunks(env.width.max(1) as usize);
        lines.extend(rows.zip(locks).map(|(rooms, locked)| {
            rooms
                .iter()
                .zip(locked)
                .map(|(&room, &locked)| {
                    let room = i32::from(room);
                    let signed = if locked { -room } else { room };
                    signed.to_string()
                })
                .collect::<Vec<_>>()
                .join(" ")
        }));
        lines.push(env.exit_x.to_string());
        lines
    }

    fn format_turn_input(
        &self,
        state: &FallState,
        _env: &Tunnel,
        _player: PlayerId,
    ) -> Vec<String> {
        let token_line = |t: &Token| format!("{} {} {}", t.x, t.y, t.entry);
        let mut lines = Vec::with_capacity(state.rocks.len() + 2);
        lines.push(token_line(&state.indy));
        lines.push(state.rocks.len().to_string());
        lines.extend(state.rocks.iter().map(token_line));
        lines
    }

    fn parse_output(&self, line: &str, _player: PlayerId) -> Result<FallCommand, ParseError> {
        let upper = line.to_ascii_uppercase();
        let mut tokens = upper.split_whitespace().peekable();
        if tokens.peek() == Some(&"WAIT") {
            return Ok(FallCommand::Wait);
        }
        let x = parse_int(line, tokens.next(), "x")?;
        let y = parse_int(line, tokens.next(), "y")?;
        let turn = match tokens.next() {
            Some("LEFT") => Turn::Left,
            Some("RIGHT") => Turn::Right,
            Some(other) => return Err(ParseError::new(line, format!("invalid rotation '{other}'"))),
            None => return Err(ParseError::new(line, "missing rotation")),
        };
        Ok(FallCommand::Rotate {
            pos: GridPos::new(x, y),
            turn,
        })
    }

    fn simulate(
        &self,
        state: &FallState,
        controls: &[FallCommand],
        env: &Tunnel,
    ) -> (FallState, SimResult) {
        step(state, controls.first().copied().unwrap_or(FallCommand::Wait), env)
    }

    fn compare_state(&self, state: &FallState, expected: &TraceEntry) -> Vec<String> {
        let mut mismatches = Vec::new();
        let as_json = |t: &Token| serde_json::json!([t.x, t.y, t.entry.as_str()]);

        if let Some(want) = expected.field("indy") {
            let got = as_json(&state.indy);
            if &got != want {
                mismatches.push(format!("indy: got {got}, expected {want}"));
            }
        }

        if let Some(want) = expected.field("rocks").and_then(|v| v.as_array()) {
            let mut got: Vec<_> = state.rocks.iter().map(as_json).collect();
            got.sort_by_key(|v| v.to_string());
            let mut want = want.clone();
            want.sort_by_key(|v| v.to_string());
            if got != want {
                mismatches.push(format!(
                    "rocks: got {}, expected {}",
                    serde_json::Value::Array(got),
                    serde_json::Value::Array(want)
                ));
            }
        }
        mismatches
    }

    fn describe(&self, state: &FallState) -> String {
        let rocks: Vec<String> = state
            .rocks
            .iter()
            .map(|r| format!("({},{},{})", r.x, r.y, r.entry))
            .collect();
        format!(
            "Indy@({},{},{}) rocks=[{}] turn={}",
            state.indy.x,
            state.indy.y,
            state.indy.entry,
            rocks.join(", "),
            state.turn
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x3 level: Indy starts top-middle in a vertical shaft.
    fn level(grid: Vec<Vec<i32>>) -> (Tunnel, FallState) {
        let case = FallCase {
            name: None,
            width: 3,
            height: 3,
            exit_x: 1,
            grid,
            indy: Some(Token { x: 1, y: 0, entry: Entry::Top }),
            rocks: Vec::new(),
            scheduled_rocks: Vec::new(),
        };
        TheFall::new(Catalog::new().with("lvl", case)).load_test_case("lvl").unwrap()
    }

    fn run(
        model: &TheFall,
        env: &Tunnel,
        mut state: FallState,
        cmds: &[&str],
    ) -> (FallState, SimResult) {
        let mut result = SimResult::Running;
        for cmd in cmds {
            let control = model.parse_output(cmd, PlayerId::SOLO).unwrap();
            let (next, r) = model.simulate(&state, &[control], env);
            state = next;
            result = r;
            if result.is_terminal() {
                break;
            }
        }
        (state, result)
    }

    #[test]
    fn test_rotation_cycles() {
        for room in 0..14u8 {
            assert_eq!(rotate(rotate(room, Turn::Right), Turn::Left), room);
        }
        let mut room = 6;
        for _ in 0..4 {
            room = rotate(room, Turn::Right);
        }
        assert_eq!(room, 6);
        assert_eq!(rotate(10, Turn::Left), 13);
        assert_eq!(rotate(1, Turn::Right), 1);
    }

    #[test]
    fn test_routes() {
        assert_eq!(route(4, Entry::Top), TO_LEFT);
        assert_eq!(route(5, Entry::Left), DOWN);
        assert_eq!(route(2, Entry::Top), BLOCKED);
        assert_eq!(route(0, Entry::Right), BLOCKED);
        assert_eq!(route(99, Entry::Top), BLOCKED);
    }

    #[test]
    fn test_straight_shaft_reaches_exit() {
        let model = TheFall::default();
        let (env, state) = level(vec![vec![0, 3, 0], vec![0, 3, 0], vec![0, 3, 0]]);
        let (state, result) = run(&model, &env, state, &["WAIT", "WAIT"]);
        assert_eq!(result, SimResult::success());
        assert_eq!(state.indy, Token { x: 1, y: 2, entry: Entry::Top });
    }

    #[test]
    fn test_rotation_unblocks_path() {
        let model = TheFall::default();
        // The middle room is horizontal (2) and must be turned into a shaft (3).
        let (env, state) = level(vec![vec![0, 3, 0], vec![0, 2, 0], vec![0, 3, 0]]);
        let (_, result) = run(&model, &env, state.clone(), &["WAIT"]);
        assert_eq!(result, SimResult::failure("Indy blocked at (1,0)"));

        let (state, result) = run(&model, &env, state, &["1 1 RIGHT", "WAIT"]);
        assert_eq!(result, SimResult::success());
        assert_eq!(state.rooms[4], 3);
    }

    #[test]
    fn test_locked_rotation_is_skipped() {
        let model = TheFall::default();
        let (env, state) = level(vec![vec![0, 3, 0], vec![0, -2, 0], vec![0, 3, 0]]);
        assert_eq!(model.format_init_input(&env)[2], "0 -2 0");
        let (_, result) = run(&model, &env, state, &["1 1 RIGHT"]);
        assert_eq!(result, SimResult::failure("Indy blocked at (1,0)"));
    }

    #[test]
    fn test_rock_moves_with_indy() {
        let model = TheFall::default();
        let (env, mut state) = level(vec![vec![0, 3, 0], vec![0, 3, 0], vec![0, 3, 0]]);
        state.rocks.push(Token { x: 1, y: 1, entry: Entry::Top });
        let (next, result) = model.simulate(&state, &[FallCommand::Wait], &env);
        assert!(result.is_running());
        assert_eq!(next.indy.pos(), GridPos::new(1, 1));
        assert_eq!(next.rocks.as_slice(), &[Token { x: 1, y: 2, entry: Entry::Top }]);

        // Reaching the exit room wins before rocks are resolved.
        let (_, result) = model.simulate(&next, &[FallCommand::Wait], &env);
        assert_eq!(result, SimResult::success());
    }

    #[test]
    fn test_indy_hits_rock() {
        let model = TheFall::default();
        let (env, mut state) = level(vec![vec![0, 3, 0], vec![5, 1, 0], vec![0, 3, 0]]);
        // Room 5 sends the rock right, into the room Indy falls into.
        state.rocks.push(Token { x: 0, y: 1, entry: Entry::Top });
        let (next, result) = model.simulate(&state, &[FallCommand::Wait], &env);
        assert_eq!(result, SimResult::failure("Indy hit rock at (1,1)"));
        assert_eq!(next.turn, 1);
    }

    #[test]
    fn test_colliding_rocks_annihilate_first() {
        let model = TheFall::default();
        let (env, mut state) = level(vec![vec![0, 3, 0], vec![11, 1, 10], vec![0, 3, 0]]);
        // Both rocks enter Indy's new room from opposite sides.
        state.rocks.push(Token { x: 0, y: 1, entry: Entry::Top });
        state.rocks.push(Token { x: 2, y: 1, entry: Entry::Top });
        let (next, result) = model.simulate(&state, &[FallCommand::Wait], &env);
        assert!(result.is_running());
        assert!(next.rocks.is_empty());
    }

    #[test]
    fn test_blocked_rock_is_destroyed() {
        let model = TheFall::default();
        let (env, mut state) = level(vec![vec![0, 3, 0], vec![0, 3, 0], vec![0, 3, 0]]);
        state.rocks.push(Token { x: 0, y: 0, entry: Entry::Top });
        let (next, _) = model.simulate(&state, &[FallCommand::Wait], &env);
        assert!(next.rocks.is_empty());
    }

    #[test]
    fn test_scheduled_rock_appears() {
        let model = TheFall::default();
        let (mut env, state) = level(vec![vec![0, 3, 3], vec![0, 3, 3], vec![0, 3, 3]]);
        env.scheduled_rocks.push(ScheduledRock { turn: 1, x: 2, y: 0, entry: Entry::Top });
        let (next, _) = model.simulate(&state, &[FallCommand::Wait], &env);
        assert_eq!(next.rocks.len(), 1);
        assert_eq!(
            model.format_turn_input(&next, &env, PlayerId::SOLO),
            vec!["1 1 TOP".to_string(), "1".to_string(), "2 0 TOP".to_string()]
        );
    }

    #[test]
    fn test_parse_output() {
        let model = TheFall::default();
        assert_eq!(model.parse_output("wait", PlayerId::SOLO).unwrap(), FallCommand::Wait);
        assert_eq!(
            model.parse_output("2 3 left", PlayerId::SOLO).unwrap(),
            FallCommand::Rotate { pos: GridPos::new(2, 3), turn: Turn::Left }
        );
        assert!(model.parse_output("2 3 UP", PlayerId::SOLO).is_err());
        assert!(model.parse_output("2", PlayerId::SOLO).is_err());
    }

    #[test]
    fn test_compare_state() {
        let model = TheFall::default();
        let (_, state) = level(vec![vec![0, 3, 0], vec![0, 3, 0], vec![0, 3, 0]]);
        let entry = TraceEntry::single(1, "WAIT")
            .expect("indy", serde_json::json!([1, 0, "TOP"]))
            .expect("rocks", serde_json::json!([]));
        assert!(model.compare_state(&state, &entry).is_empty());
        let entry = TraceEntry::single(1, "WAIT").expect("indy", serde_json::json!([1, 1, "TOP"]));
        assert_eq!(model.compare_state(&state, &entry).len(), 1);
    }
}
