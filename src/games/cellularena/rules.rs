//! Turn resolution for Cellularena.
//!
//! A turn runs in five phases over a working copy of the state:
//!
//! 1. growth collisions: a cell targeted by two players becomes a wall
//! 2. GROW orders, in player order
//! 3. SPORE orders, in player order
//! 4. harvest
//! 5. tentacle attacks
//!
//! Invalid orders are skipped; each check runs before any mutation, so a
//! skipped order leaves no trace.

use std::collections::BTreeMap;

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;

use super::types::{Action, Order, Organ, OrganKind, Protein, Proteins, Tile};
use crate::core::{Dir, GridPos, PlayerId, PlayerMap, SimResult};

/// Turn at which the game stops.
pub const MAX_TURNS: u32 = 100;
/// Protein gained by growing onto a source.
pub const ABSORB_GAIN: u32 = 3;

/// Static arena description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Arena {
    pub width: i32,
    pub height: i32,
    pub players: usize,
}

/// Grid contents, protein stocks and the id counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArenaState {
    pub tiles: im::OrdMap<GridPos, Tile>,
    pub proteins: PlayerMap<Proteins>,
    pub next_organ_id: u32,
    pub turn: u32,
}

impl ArenaState {
    /// Organ with the given id, and where it sits.
    #[must_use]
    pub fn find_organ(&self, id: u32) -> Option<(GridPos, Organ)> {
        self.organs().find(|(_, organ)| organ.id == id)
    }

    pub fn organs(&self) -> impl Iterator<Item = (GridPos, Organ)> + '_ {
        self.tiles
            .iter()
            .filter_map(|(&pos, tile)| tile.organ().map(|&organ| (pos, organ)))
    }

    /// Distinct organisms (root ids) owned by `player`.
    #[must_use]
    pub fn root_count(&self, player: PlayerId) -> usize {
        let roots: FxHashSet<u32> = self
            .organs()
            .filter(|(_, organ)| organ.owner == player)
            .map(|(_, organ)| organ.root_id)
            .collect();
        roots.len()
    }

    #[must_use]
    pub fn organ_count(&self, player: PlayerId) -> usize {
        self.organs().filter(|(_, organ)| organ.owner == player).count()
    }

    fn stock(&self, player: PlayerId) -> Proteins {
        self.proteins.get(player).copied().unwrap_or_default()
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_organ_id;
        self.next_organ_id += 1;
        id
    }

    /// Pay `cost`, then credit any protein absorbed at the target.
    fn settle(&mut self, player: PlayerId, paid: Proteins, absorbed: Option<Protein>) {
        if let Some(stock) = self.proteins.get_mut(player) {
            *stock = paid;
            if let Some(protein) = absorbed {
                stock[protein] += ABSORB_GAIN;
            }
        }
    }
}

/// A GROW that passed validation.
struct Growth {
    parent: Organ,
    paid: Proteins,
    absorbed: Option<Protein>,
}

fn check_grow(
    state: &ArenaState,
    arena: &Arena,
    player: PlayerId,
    parent_id: u32,
    target: GridPos,
    kind: OrganKind,
) -> Result<Growth, String> {
    let (parent_pos, parent) = state
        .find_organ(parent_id)
        .ok_or_else(|| format!("parent organ {parent_id} not found"))?;
    if parent.owner != player {
        return Err(format!("parent organ {parent_id} not owned by {player}"));
    }
    if !parent_pos.is_adjacent(target) {
        return Err(format!("{target} not adjacent to parent {parent_pos}"));
    }
    if !target.in_bounds(arena.width, arena.height) {
        return Err(format!("{target} out of bounds"));
    }
    let absorbed = match state.tiles.get(&target) {
        Some(Tile::Source(protein)) => Some(*protein),
        Some(tile) => return Err(format!("cannot grow on {} at {target}", tile.type_name())),
        None => None,
    };
    let stock = state.stock(player);
    let paid = stock.debit(&kind.cost()).ok_or_else(|| {
        let missing = stock.shortfall(&kind.cost()).map_or("?", Protein::as_str);
        format!("not enough {missing} protein for {}", kind.as_str())
    })?;
    Ok(Growth { parent, paid, absorbed })
}

fn check_spore(
    state: &ArenaState,
    arena: &Arena,
    player: PlayerId,
    sporer_id: u32,
    target: GridPos,
) -> Result<(Proteins, Option<Protein>), String> {
    let (pos, sporer) = state
        .find_organ(sporer_id)
        .ok_or_else(|| format!("sporer {sporer_id} not found"))?;
    if sporer.owner != player {
        return Err(format!("sporer {sporer_id} not owned by {player}"));
    }
    if sporer.kind != OrganKind::Sporer {
        return Err(format!("organ {sporer_id} is a {}", sporer.kind.as_str()));
    }
    if !target.in_bounds(arena.width, arena.height) {
        return Err(format!("{target} out of bounds"));
    }

    let mut cell = pos;
    loop {
        cell = cell.step(sporer.dir);
        if !cell.in_bounds(arena.width, arena.height) {
            return Err(format!("{target} not in front of sporer {sporer_id}"));
        }
        if state.tiles.get(&cell).is_some_and(Tile::is_solid) {
            return Err(format!("spore path blocked at {cell}"));
        }
        if cell == target {
            break;
        }
    }

    let paid = state
        .stock(player)
        .debit(&Proteins::ONE_OF_EACH)
        .ok_or_else(|| "not enough protein for a spore".to_string())?;
    let absorbed = match state.tiles.get(&target) {
        Some(Tile::Source(protein)) => Some(*protein),
        _ => None,
    };
    Ok((paid, absorbed))
}

/// Cells claimed by GROW orders of more than one player, judged against
/// the state at the start of the turn.
fn contested_cells(state: &ArenaState, arena: &Arena, orders: &[Order]) -> Vec<GridPos> {
    let mut claims: BTreeMap<GridPos, SmallVec<[PlayerId; 2]>> = BTreeMap::new();
    for order in orders {
        if let Action::Grow {
            parent_id,
            target,
            kind,
            ..
        } = order.action
        {
            if check_grow(state, arena, order.player, parent_id, target, kind).is_ok() {
                let claimants = claims.entry(target).or_default();
                if !claimants.contains(&order.player) {
                    claimants.push(order.player);
                }
            }
        }
    }
    claims
        .into_iter()
        .filter(|(_, claimants)| claimants.len() > 1)
        .map(|(pos, _)| pos)
        .collect()
}

fn grow_phase(state: &mut ArenaState, arena: &Arena, orders: &[Order], contested: &[GridPos]) {
    for order in orders {
        let Action::Grow {
            parent_id,
            target,
            kind,
            dir,
        } = order.action
        else {
            continue;
        };
        if contested.contains(&target) {
            continue;
        }
        match check_grow(state, arena, order.player, parent_id, target, kind) {
            Ok(growth) => {
                let organ = Organ {
                    id: state.take_id(),
                    kind,
                    owner: order.player,
                    dir,
                    parent_id,
                    root_id: growth.parent.root_id,
                };
                state.tiles.insert(target, Tile::Organ(organ));
                state.settle(order.player, growth.paid, growth.absorbed);
            }
            Err(reason) => debug!("cellularena: {} GROW skipped, {reason}", order.player),
        }
    }
}

fn spore_phase(state: &mut ArenaState, arena: &Arena, orders: &[Order]) {
    for order in orders {
        let Action::Spore { sporer_id, target } = order.action else {
            continue;
        };
        match check_spore(state, arena, order.player, sporer_id, target) {
            Ok((paid, absorbed)) => {
                let id = state.take_id();
                let root = Organ {
                    id,
                    kind: OrganKind::Root,
                    owner: order.player,
                    dir: Dir::N,
                    parent_id: 0,
                    root_id: id,
                };
                state.tiles.insert(target, Tile::Organ(root));
                state.settle(order.player, paid, absorbed);
            }
            Err(reason) => debug!("cellularena: {} SPORE skipped, {reason}", order.player),
        }
    }
}

/// Every harvester facing a source yields one protein, at most once per
/// source and owner.
fn harvest_phase(state: &mut ArenaState) {
    let mut harvested: FxHashSet<(PlayerId, GridPos)> = FxHashSet::default();
    let mut gains: SmallVec<[(PlayerId, Protein); 8]> = SmallVec::new();
    for (pos, organ) in state.organs() {
        if organ.kind != OrganKind::Harvester {
            continue;
        }
        let source = organ.facing(pos);
        if let Some(Tile::Source(protein)) = state.tiles.get(&source) {
            if harvested.insert((organ.owner, source)) {
                gains.push((organ.owner, *protein));
            }
        }
    }
    for (player, protein) in gains {
        if let Some(stock) = state.proteins.get_mut(player) {
            stock[protein] += 1;
        }
    }
}

/// Tentacles destroy the enemy organ they face together with its subtree.
/// All victims are chosen before anything is removed.
fn attack_phase(state: &mut ArenaState) {
    let victims: SmallVec<[u32; 4]> = state
        .organs()
        .filter(|(_, organ)| organ.kind == OrganKind::Tentacle)
        .filter_map(|(pos, tentacle)| match state.tiles.get(&tentacle.facing(pos)) {
            Some(Tile::Organ(target)) if target.owner != tentacle.owner => Some(target.id),
            _ => None,
        })
        .collect();
    if victims.is_empty() {
        return;
    }

    let mut children: FxHashMap<u32, SmallVec<[u32; 4]>> = FxHashMap::default();
    let mut position: FxHashMap<u32, GridPos> = FxHashMap::default();
    for (pos, organ) in state.organs() {
        position.insert(organ.id, pos);
        if organ.parent_id != 0 && organ.parent_id != organ.id {
            children.entry(organ.parent_id).or_default().push(organ.id);
        }
    }

    let mut doomed: FxHashSet<u32> = FxHashSet::default();
    let mut stack: Vec<u32> = victims.into_vec();
    while let Some(id) = stack.pop() {
        if doomed.insert(id) {
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().copied());
            }
        }
    }

    for id in &doomed {
        if let Some(pos) = position.get(id) {
            state.tiles.remove(pos);
        }
    }
    debug!("cellularena: tentacles destroyed {} organ(s)", doomed.len());
}

/// Resolve one full turn.
#[must_use]
pub fn resolve_turn(
    state: &ArenaState,
    orders: &[Order],
    arena: &Arena,
) -> (ArenaState, SimResult) {
    let contested = contested_cells(state, arena, orders);

    let mut next = state.clone();
    for &pos in &contested {
        if next.tiles.contains_key(&pos) {
            debug!("cellularena: growth collision at {pos}, cell kept");
            continue;
        }
        debug!("cellularena: growth collision at {pos}, wall raised");
        next.tiles.insert(pos, Tile::Wall);
    }
    grow_phase(&mut next, arena, orders, &contested);
    spore_phase(&mut next, arena, orders);
    harvest_phase(&mut next);
    attack_phase(&mut next);
    next.turn = state.turn + 1;

    let result = if next.turn >= MAX_TURNS {
        SimResult::success_because("max turns reached")
    } else if state.turn > 0 && orders.iter().all(Order::is_wait) {
        SimResult::success_because("no progress - all WAIT")
    } else {
        SimResult::Running
    };
    (next, result)
}
