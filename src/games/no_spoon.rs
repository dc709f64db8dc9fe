//! There is no Spoon: bridge-building (Hashiwokakero).
//!
//! Every node wants a fixed number of links. Each output line places one
//! horizontal or vertical link of 1 or 2 between two cells. The game ends
//! as soon as every node's remaining count reaches zero. There is no
//! per-turn input.
//!
//! Links crossing each other, links passing over nodes and global
//! connectivity are not validated.

use serde::{Deserialize, Serialize};

use crate::core::error::parse_int;
use crate::core::{GridPos, HarnessError, HarnessResult, ParseError, PlayerId, SimResult};
use crate::model::{Catalog, CatalogEntry, Model};
use crate::replay::TraceEntry;

/// The puzzle board as loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Board {
    pub width: i32,
    pub height: i32,
    /// Link count wanted by each node.
    pub nodes: Vec<(GridPos, u8)>,
}

/// One placed link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Link {
    pub from: GridPos,
    pub to: GridPos,
    /// Only 1 and 2 are legal; anything else fails the game.
    pub amount: i32,
}

/// Remaining link counts and the links placed so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpoonState {
    pub remaining: im::OrdMap<GridPos, u8>,
    pub links: im::Vector<Link>,
}

impl SpoonState {
    /// True once every node is fully linked.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.remaining.values().all(|&left| left == 0)
    }
}

fn link_fault(link: &Link, board: &Board) -> Option<String> {
    if !(1..=2).contains(&link.amount) {
        return Some(format!("invalid amount: {}", link.amount));
    }
    for end in [link.from, link.to] {
        if !end.in_bounds(board.width, board.height) {
            return Some(format!("{end} out of bounds"));
        }
    }
    if link.from == link.to {
        return Some("link endpoints must be different".into());
    }
    if link.from.x != link.to.x && link.from.y != link.to.y {
        return Some("link must be horizontal or vertical".into());
    }
    None
}

/// Place one link.
///
/// Any rule violation fails the game and leaves the state unchanged.
#[must_use]
pub fn place(state: &SpoonState, link: Link, board: &Board) -> (SpoonState, SimResult) {
    if let Some(fault) = link_fault(&link, board) {
        return (state.clone(), SimResult::failure(fault));
    }

    let Ok(amount) = u8::try_from(link.amount) else {
        return (state.clone(), SimResult::failure(format!("invalid amount: {}", link.amount)));
    };
    let mut remaining = state.remaining.clone();
    for end in [link.from, link.to] {
        // Empty cells have nothing left to give.
        let left = remaining.get(&end).copied().unwrap_or(0);
        let Some(left) = left.checked_sub(amount) else {
            return (state.clone(), SimResult::failure(format!("node {end} has too many links")));
        };
        remaining.insert(end, left);
    }

    let mut links = state.links.clone();
    links.push_back(link);
    let next = SpoonState { remaining, links };
    let result = if next.is_solved() {
        SimResult::success()
    } else {
        SimResult::Running
    };
    (next, result)
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpoonCase {
    #[serde(default)]
    pub name: Option<String>,
    pub width: i32,
    pub height: i32,
    /// Rows of `.` (empty) and digits (nodes).
    pub grid: Vec<String>,
}

impl CatalogEntry for SpoonCase {
    fn title(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// There is no Spoon Episode 2 model.
#[derive(Clone, Debug, Default)]
pub struct ThereIsNoSpoon {
    cases: Catalog<SpoonCase>,
}

impl ThereIsNoSpoon {
    pub const NAME: &'static str = "there_is_no_spoon";

    #[must_use]
    pub fn new(cases: Catalog<SpoonCase>) -> Self {
        Self { cases }
    }
}

impl Model for ThereIsNoSpoon {
    type Env = Board;
    type State = SpoonState;
    type Control = Link;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "There is no Spoon Episode 2"
    }

    fn test_cases(&self) -> Vec<(String, String)> {
        self.cases.listing()
    }

    fn load_test_case(&self, name: &str) -> HarnessResult<(Board, SpoonState)> {
        let case = self.cases.get(name).ok_or_else(|| HarnessError::TestCaseNotFound {
            model: Self::NAME,
            name: name.to_string(),
        })?;

        let mut nodes = Vec::new();
        for (y, row) in case.grid.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '.' {
                    continue;
                }
                let wanted = ch.to_digit(10).ok_or_else(|| HarnessError::InvalidTestCase {
                    name: name.to_string(),
                    reason: format!("unexpected cell '{ch}'"),
                })?;
                nodes.push((GridPos::new(x as i32, y as i32), wanted as u8));
            }
        }

        let state = SpoonState {
            remaining: nodes.iter().copied().collect(),
            links: im::Vector::new(),
        };
        let board = Board {
            width: case.width,
            height: case.height,
            nodes,
        };
        Ok((board, state))
    }

    fn format_init_input(&self, env: &Board) -> Vec<String> {
        let mut rows = vec![vec!['.'; env.width.max(0) as usize]; env.height.max(0) as usize];
        for &(pos, wanted) in &env.nodes {
            let cell = rows.get_mut(pos.y as usize).and_then(|row| row.get_mut(pos.x as usize));
            if let Some(cell) = cell {
                *cell = char::from(b'0' + wanted);
            }
        }
        let mut lines = vec![env.width.to_string(), env.height.to_string()];
        lines.extend(rows.into_iter().map(String::from_iter));
        lines
    }

    fn format_turn_input(
        &self,
        _state: &SpoonState,
        _env: &Board,
        _player: PlayerId,
    ) -> Vec<String> {
        Vec::new()
    }

    fn parse_output(&self, line: &str, _player: PlayerId) -> Result<Link, ParseError> {
        let mut tokens = line.split_whitespace();
        let x1 = parse_int(line, tokens.next(), "x1")?;
        let y1 = parse_int(line, tokens.next(), "y1")?;
        let x2 = parse_int(line, tokens.next(), "x2")?;
        let y2 = parse_int(line, tokens.next(), "y2")?;
        let amount = parse_int(line, tokens.next(), "link count")?;
        Ok(Link {
            from: GridPos::new(x1, y1),
            to: GridPos::new(x2, y2),
            amount,
        })
    }

    fn simulate(
        &self,
        state: &SpoonState,
        controls: &[Link],
        env: &Board,
    ) -> (SpoonState, SimResult) {
        match controls.first() {
            Some(&link) => place(state, link, env),
            None => (state.clone(), SimResult::failure("no link given")),
        }
    }

    fn compare_state(&self, state: &SpoonState, expected: &TraceEntry) -> Vec<String> {
        match expected.int_field("links") {
            Some(want) if want != state.links.len() as i64 => {
                vec![format!("links: got {}, expected {want}", state.links.len())]
            }
            _ => Vec::new(),
        }
    }

    fn describe(&self, state: &SpoonState) -> String {
        let open = state.remaining.values().filter(|&&left| left > 0).count();
        format!("links={}, unsatisfied nodes={open}", state.links.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(grid: &[&str]) -> (ThereIsNoSpoon, Board, SpoonState) {
        let case = SpoonCase {
            name: Some("Tiny".into()),
            width: grid[0].len() as i32,
            height: grid.len() as i32,
            grid: grid.iter().map(|row| row.to_string()).collect(),
        };
        let model = ThereIsNoSpoon::new(Catalog::new().with("tiny", case));
        let (board, state) = model.load_test_case("tiny").unwrap();
        (model, board, state)
    }

    fn link(model: &ThereIsNoSpoon, line: &str) -> Link {
        model.parse_output(line, PlayerId::SOLO).unwrap()
    }

    #[test]
    fn test_solve_small_puzzle() {
        let (model, board, state) = load(&["2.1", "...", "1.."]);
        assert_eq!(model.format_init_input(&board), vec!["3", "3", "2.1", "...", "1.."]);
        assert!(model.format_turn_input(&state, &board, PlayerId::SOLO).is_empty());

        let (state, result) = model.simulate(&state, &[link(&model, "0 0 2 0 1")], &board);
        assert!(result.is_running());
        let (state, result) = model.simulate(&state, &[link(&model, "0 0 0 2 1")], &board);
        assert_eq!(result, SimResult::success());
        assert_eq!(state.links.len(), 2);
        assert!(state.is_solved());
    }

    #[test]
    fn test_over_linking_fails_without_change() {
        let (model, board, state) = load(&["2.1", "...", "1.."]);
        let (after, result) = model.simulate(&state, &[link(&model, "0 0 2 0 2")], &board);
        assert_eq!(result, SimResult::failure("node (2,0) has too many links"));
        assert_eq!(after, state);
    }

    #[test]
    fn test_rejected_links() {
        let (model, board, state) = load(&["2.1", "...", "1.."]);
        let cases = [
            ("0 0 2 0 3", "invalid amount: 3"),
            ("0 0 2 0 -1", "invalid amount: -1"),
            ("0 0 2 0 300", "invalid amount: 300"),
            ("0 0 2 0 0", "invalid amount: 0"),
            ("0 0 3 0 1", "(3,0) out of bounds"),
            ("0 0 2 2 1", "link must be horizontal or vertical"),
            ("0 0 0 0 1", "link endpoints must be different"),
            ("0 0 1 0 1", "node (1,0) has too many links"),
        ];
        for (line, reason) in cases {
            let (_, result) = model.simulate(&state, &[link(&model, line)], &board);
            assert_eq!(result, SimResult::failure(reason), "{line}");
        }
    }

    #[test]
    fn test_parse_output() {
        let model = ThereIsNoSpoon::default();
        assert!(model.parse_output("0 0 1", PlayerId::SOLO).is_err());
        assert!(model.parse_output("0 0 1 0 x", PlayerId::SOLO).is_err());
        assert_eq!(model.parse_output("0 0 1 0 -1", PlayerId::SOLO).unwrap().amount, -1);
        assert_eq!(model.parse_output("0 0 1 0 300", PlayerId::SOLO).unwrap().amount, 300);
    }
}
