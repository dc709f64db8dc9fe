//! Cellularena: organisms of several players grow across a shared grid.
//!
//! Each turn every player writes one order per organism it owns. Orders are
//! resolved together by [`rules::resolve_turn`]; see that module for the
//! phase order.
//!
//! ## Owner perspective
//!
//! Programs see owners from their own point of view: `1` is the receiving
//! player, `0` any opponent, `-1` nobody. [`Cellularena::with_raw_owners`]
//! turns this off and sends seat numbers instead.

pub mod rules;
pub mod types;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::core::error::parse_int;
use crate::core::{
    Dir, GridPos, HarnessError, HarnessResult, ParseError, PlayerId, PlayerMap, SimResult,
};
use crate::model::{Catalog, CatalogEntry, Model};
use crate::replay::TraceEntry;

pub use rules::{resolve_turn, Arena, ArenaState, MAX_TURNS};
pub use types::{Action, Order, Organ, OrganKind, Protein, Proteins, Tile};

/// One entity of a test-case file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySpec {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "neutral")]
    pub owner: i64,
    #[serde(default)]
    pub organ_id: u32,
    #[serde(default)]
    pub organ_dir: Option<String>,
    #[serde(default)]
    pub organ_parent_id: u32,
    #[serde(default)]
    pub organ_root_id: u32,
}

fn neutral() -> i64 {
    -1
}

fn default_players() -> usize {
    2
}

impl EntitySpec {
    fn to_tile(&self) -> Result<Tile, String> {
        if self.kind == "WALL" {
            return Ok(Tile::Wall);
        }
        if let Some(protein) = Protein::parse(&self.kind) {
            return Ok(Tile::Source(protein));
        }
        let kind = OrganKind::parse(&self.kind)
            .ok_or_else(|| format!("unknown entity type '{}'", self.kind))?;
        let owner = PlayerId::from_wire_owner(self.owner)
            .ok_or_else(|| {
                format!("organ {} at ({},{}) has no owner", self.organ_id, self.x, self.y)
            })?;
        let dir = match self.organ_dir.as_deref() {
            None => Dir::N,
            Some(token) => {
                Dir::parse(token).ok_or_else(|| format!("bad organ direction '{token}'"))?
            }
        };
        Ok(Tile::Organ(Organ {
            id: self.organ_id,
            kind,
            owner,
            dir,
            parent_id: self.organ_parent_id,
            root_id: self.organ_root_id,
        }))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ArenaCase {
    #[serde(default)]
    pub name: Option<String>,
    pub width: i32,
    pub height: i32,
    #[serde(default = "default_players")]
    pub num_players: usize,
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    /// `{"0": {"A": 10, ...}}`; missing players start with [`Proteins::STARTING`].
    #[serde(default)]
    pub proteins: BTreeMap<String, BTreeMap<String, u32>>,
}

impl CatalogEntry for ArenaCase {
    fn title(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Cellularena (Winter Challenge 2024) model.
#[derive(Clone, Debug, Default)]
pub struct Cellularena {
    cases: Catalog<ArenaCase>,
    raw_owners: bool,
}

impl Cellularena {
    pub const NAME: &'static str = "cellularena";

    #[must_use]
    pub fn new(cases: Catalog<ArenaCase>) -> Self {
        Self {
            cases,
            raw_owners: false,
        }
    }

    /// Send seat numbers as owners instead of the 1/0/-1 perspective.
    #[must_use]
    pub fn with_raw_owners(mut self) -> Self {
        self.raw_owners = true;
        self
    }

    fn owner_for(&self, owner: Option<PlayerId>, viewer: PlayerId) -> i32 {
        match owner {
            _ if self.raw_owners => PlayerId::wire_owner(owner),
            None => -1,
            Some(owner) if owner == viewer => 1,
            Some(_) => 0,
        }
    }
}

fn stock_from_spec(spec: &BTreeMap<String, u32>) -> Proteins {
    let mut stock = Proteins::default();
    for protein in Protein::ALL {
        stock[protein] = spec.get(protein.as_str()).copied().unwrap_or(0);
    }
    stock
}

impl Model for Cellularena {
    type Env = Arena;
    type State = ArenaState;
    type Control = Order;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Cellularena - Winter Challenge 2024"
    }

    fn test_cases(&self) -> Vec<(String, String)> {
        self.cases.listing()
    }

    fn load_test_case(&self, name: &str) -> HarnessResult<(Arena, ArenaState)> {
        let case = self.cases.get(name).ok_or_else(|| HarnessError::TestCaseNotFound {
            model: Self::NAME,
            name: name.to_string(),
        })?;
        let invalid = |reason: String| HarnessError::InvalidTestCase {
            name: name.to_string(),
            reason,
        };
        if case.num_players == 0 || case.num_players > 4 {
            return Err(invalid(format!("{} players, expected 1 to 4", case.num_players)));
        }

        let mut tiles = im::OrdMap::new();
        let mut max_id = 0;
        for spec in &case.entities {
            let tile = spec.to_tile().map_err(&invalid)?;
            max_id = max_id.max(spec.organ_id);
            tiles.insert(GridPos::new(spec.x, spec.y), tile);
        }

        let proteins = PlayerMap::new(case.num_players, |player| {
            case.proteins
                .get(&player.index().to_string())
                .map_or(Proteins::STARTING, stock_from_spec)
        });

        let arena = Arena {
            width: case.width,
            height: case.height,
            players: case.num_players,
        };
        let state = ArenaState {
            tiles,
            proteins,
            next_organ_id: max_id + 1,
            turn: 0,
        };
        Ok((arena, state))
    }

    fn player_count(&self, env: &Arena) -> usize {
        env.players
    }

    fn format_init_input(&self, env: &Arena) -> Vec<String> {
        vec![format!("{} {}", env.width, env.height)]
    }

    fn format_turn_input(&self, state: &ArenaState, _env: &Arena, player: PlayerId) -> Vec<String> {
        let mut lines = Vec::with_capacity(state.tiles.len() + 4);
        lines.push(state.tiles.len().to_string());
        for (pos, tile) in &state.tiles {
            let owner = self.owner_for(tile.owner(), player);
            let line = match tile.organ() {
                Some(o) => format!(
                    "{} {} {} {owner} {} {} {} {}",
                    pos.x,
                    pos.y,
                    tile.type_name(),
                    o.id,
                    o.dir,
                    o.parent_id,
                    o.root_id
                ),
                None => format!("{} {} {} {owner} 0 X 0 0", pos.x, pos.y, tile.type_name()),
            };
            lines.push(line);
        }

        let mine = state.proteins.get(player).copied().unwrap_or_default();
        let theirs = state
            .proteins
            .iter()
            .filter(|(seat, _)| *seat != player)
            .fold(Proteins::default(), |sum, (_, stock)| sum + *stock);
        lines.push(mine.to_string());
        lines.push(theirs.to_string());
        lines.push(self.required_actions(state, player).to_string());
        lines
    }

    fn parse_output(&self, line: &str, player: PlayerId) -> Result<Order, ParseError> {
        let upper = line.to_ascii_uppercase();
        let mut tokens = upper.split_whitespace();
        let action = match tokens.next() {
            None => return Err(ParseError::new(line, "empty command")),
            Some("WAIT") => Action::Wait,
            Some("GROW") => {
                let parent_id = parse_int(line, tokens.next(), "organ id")?;
                let x = parse_int(line, tokens.next(), "x")?;
                let y = parse_int(line, tokens.next(), "y")?;
                let kind = match tokens.next().map(|t| (t, OrganKind::parse(t))) {
                    Some((_, Some(OrganKind::Root))) => {
                        return Err(ParseError::new(line, "ROOT cannot be grown"));
                    }
                    Some((_, Some(kind))) => kind,
                    Some((token, None)) => {
                        return Err(ParseError::new(line, format!("unknown organ type '{token}'")));
                    }
                    None => return Err(ParseError::new(line, "missing organ type")),
                };
                let dir = match tokens.next() {
                    None => Dir::N,
                    Some(token) => Dir::parse(token)
                        .ok_or_else(|| {
                            ParseError::new(line, format!("unknown direction '{token}'"))
                        })?,
                };
                Action::Grow {
                    parent_id,
                    target: GridPos::new(x, y),
                    kind,
                    dir,
                }
            }
            Some("SPORE") => {
                let sporer_id = parse_int(line, tokens.next(), "sporer id")?;
                let x = parse_int(line, tokens.next(), "x")?;
                let y = parse_int(line, tokens.next(), "y")?;
                Action::Spore {
                    sporer_id,
                    target: GridPos::new(x, y),
                }
            }
            Some(other) => return Err(ParseError::new(line, format!("unknown command '{other}'"))),
        };
        Ok(Order { player, action })
    }

    fn simulate(
        &self,
        state: &ArenaState,
        controls: &[Order],
        env: &Arena,
    ) -> (ArenaState, SimResult) {
        resolve_turn(state, controls, env)
    }

    fn compare_state(&self, state: &ArenaState, expected: &TraceEntry) -> Vec<String> {
        let mut mismatches = Vec::new();

        if let Some(Value::Object(by_player)) = expected.field("proteins") {
            for (seat, want) in by_player {
                let Some(player) = seat.parse::<u8>().ok().map(PlayerId) else {
                    mismatches.push(format!("proteins: bad player key '{seat}'"));
                    continue;
                };
                let got = state.proteins.get(player).copied().unwrap_or_default();
                for protein in Protein::ALL {
                    let want = want.get(protein.as_str()).and_then(Value::as_u64).unwrap_or(0);
                    if u64::from(got[protein]) != want {
                        mismatches.push(format!(
                            "{player} {}: got {}, expected {want}",
                            protein.as_str(),
                            got[protein]
                        ));
                    }
                }
            }
        }

        if let Some(Value::Array(organs)) = expected.field("new_organs") {
            for want in organs {
                let int = |key: &str| want.get(key).and_then(Value::as_i64);
                let (Some(x), Some(y)) = (int("x"), int("y")) else {
                    mismatches.push(format!("new_organs: entry without position: {want}"));
                    continue;
                };
                let kind = want.get("type").and_then(Value::as_str).unwrap_or_default();
                let owner = int("owner").unwrap_or(-1);
                let found = state.organs().find(|(pos, organ)| {
                    i64::from(pos.x) == x
                        && i64::from(pos.y) == y
                        && organ.kind.as_str() == kind
                        && i64::from(PlayerId::wire_owner(Some(organ.owner))) == owner
                });
                match (found, int("organId")) {
                    (None, _) => mismatches.push(format!("expected {kind} at ({x},{y}) not found")),
                    (Some((_, organ)), Some(id)) if i64::from(organ.id) != id => {
                        mismatches
                            .push(format!("organ at ({x},{y}): id {}, expected {id}", organ.id));
                    }
                    _ => {}
                }
            }
        }
        mismatches
    }

    fn required_actions(&self, state: &ArenaState, player: PlayerId) -> usize {
        state.root_count(player).max(1)
    }

    fn describe(&self, state: &ArenaState) -> String {
        let players: Vec<String> = state
            .proteins
            .iter()
            .map(|(player, stock)| {
                format!("{player}={} organs [{stock}]", state.organ_count(player))
            })
            .collect();
        format!("turn {}: {}", state.turn, players.join(", "))
    }
}
