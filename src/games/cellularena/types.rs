//! Cellularena vocabulary: proteins, organs, tiles and orders.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::core::{Dir, GridPos, PlayerId};

/// Protein type. Sources of each type lie on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Protein {
    A,
    B,
    C,
    D,
}

impl Protein {
    pub const ALL: [Protein; 4] = [Protein::A, Protein::B, Protein::C, Protein::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Protein::A => "A",
            Protein::B => "B",
            Protein::C => "C",
            Protein::D => "D",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Protein> {
        Protein::ALL.into_iter().find(|p| p.as_str() == token)
    }
}

/// Protein stock of one player, or a cost bundle.
///
/// Counters are unsigned; [`Proteins::debit`] refuses to go below zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proteins(pub [u32; 4]);

impl Proteins {
    /// Stock given to a player the test case says nothing about.
    pub const STARTING: Proteins = Proteins([10, 0, 0, 0]);

    /// One of each type: the price of a spore.
    pub const ONE_OF_EACH: Proteins = Proteins([1, 1, 1, 1]);

    #[must_use]
    pub fn covers(&self, cost: &Proteins) -> bool {
        self.0.iter().zip(cost.0).all(|(&have, need)| have >= need)
    }

    /// Subtract `cost`, or `None` if any counter would go negative.
    #[must_use]
    pub fn debit(&self, cost: &Proteins) -> Option<Proteins> {
        let mut left = *self;
        for (have, need) in left.0.iter_mut().zip(cost.0) {
            *have = have.checked_sub(need)?;
        }
        Some(left)
    }

    /// First protein type the stock cannot pay for.
    #[must_use]
    pub fn shortfall(&self, cost: &Proteins) -> Option<Protein> {
        Protein::ALL.into_iter().find(|&p| self[p] < cost[p])
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

impl Index<Protein> for Proteins {
    type Output = u32;

    fn index(&self, protein: Protein) -> &u32 {
        &self.0[protein as usize]
    }
}

impl IndexMut<Protein> for Proteins {
    fn index_mut(&mut self, protein: Protein) -> &mut u32 {
        &mut self.0[protein as usize]
    }
}

impl std::ops::Add for Proteins {
    type Output = Proteins;

    fn add(mut self, rhs: Proteins) -> Proteins {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
        self
    }
}

impl std::fmt::Display for Proteins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a} {b} {c} {d}")
    }
}

/// Organ type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrganKind {
    Root,
    Basic,
    Harvester,
    Tentacle,
    Sporer,
}

impl OrganKind {
    pub const ALL: [OrganKind; 5] = [
        OrganKind::Root,
        OrganKind::Basic,
        OrganKind::Harvester,
        OrganKind::Tentacle,
        OrganKind::Sporer,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrganKind::Root => "ROOT",
            OrganKind::Basic => "BASIC",
            OrganKind::Harvester => "HARVESTER",
            OrganKind::Tentacle => "TENTACLE",
            OrganKind::Sporer => "SPORER",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<OrganKind> {
        OrganKind::ALL.into_iter().find(|k| k.as_str() == token)
    }

    /// Price of growing this organ. Roots only come from spores.
    #[must_use]
    pub fn cost(self) -> Proteins {
        match self {
            OrganKind::Basic => Proteins([1, 0, 0, 0]),
            OrganKind::Harvester => Proteins([0, 0, 1, 1]),
            OrganKind::Tentacle => Proteins([0, 1, 1, 0]),
            OrganKind::Sporer => Proteins([0, 1, 0, 1]),
            OrganKind::Root => Proteins::ONE_OF_EACH,
        }
    }
}

/// A living cell of some player's organism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Organ {
    pub id: u32,
    pub kind: OrganKind,
    pub owner: PlayerId,
    pub dir: Dir,
    /// 0 for roots.
    pub parent_id: u32,
    pub root_id: u32,
}

impl Organ {
    /// The cell this organ faces.
    #[must_use]
    pub fn facing(&self, pos: GridPos) -> GridPos {
        pos.step(self.dir)
    }
}

/// Content of an occupied cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Wall,
    Source(Protein),
    Organ(Organ),
}

impl Tile {
    /// Wire type name: `WALL`, `A`..`D`, or the organ type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Tile::Wall => "WALL",
            Tile::Source(protein) => protein.as_str(),
            Tile::Organ(organ) => organ.kind.as_str(),
        }
    }

    #[must_use]
    pub fn organ(&self) -> Option<&Organ> {
        match self {
            Tile::Organ(organ) => Some(organ),
            _ => None,
        }
    }

    #[must_use]
    pub fn owner(&self) -> Option<PlayerId> {
        self.organ().map(|organ| organ.owner)
    }

    /// Walls and organs block growth; protein sources do not.
    #[must_use]
    pub fn is_solid(&self) -> bool {
        !matches!(self, Tile::Source(_))
    }
}

/// What one output line asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Wait,
    Grow {
        parent_id: u32,
        target: GridPos,
        kind: OrganKind,
        dir: Dir,
    },
    Spore {
        sporer_id: u32,
        target: GridPos,
    },
}

/// An action tagged with the player who sent it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub player: PlayerId,
    pub action: Action,
}

impl Order {
    #[must_use]
    pub fn is_wait(&self) -> bool {
        matches!(self.action, Action::Wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_costs() {
        assert_eq!(OrganKind::Basic.cost()[Protein::A], 1);
        assert_eq!(OrganKind::Harvester.cost(), Proteins([0, 0, 1, 1]));
        assert_eq!(OrganKind::Tentacle.cost().total(), 2);
        assert_eq!(OrganKind::Sporer.cost()[Protein::D], 1);
    }

    #[test]
    fn test_debit_never_goes_negative() {
        let stock = Proteins([1, 0, 2, 0]);
        assert_eq!(stock.debit(&OrganKind::Basic.cost()), Some(Proteins([0, 0, 2, 0])));
        assert_eq!(stock.debit(&OrganKind::Harvester.cost()), None);
        assert_eq!(stock.shortfall(&OrganKind::Harvester.cost()), Some(Protein::D));
        assert!(stock.covers(&Proteins::default()));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(Protein::parse("C"), Some(Protein::C));
        assert_eq!(Protein::parse("E"), None);
        assert_eq!(OrganKind::parse("SPORER"), Some(OrganKind::Sporer));
        assert_eq!(OrganKind::parse("sporer"), None);
    }

    #[test]
    fn test_tile_solidity() {
        assert!(Tile::Wall.is_solid());
        assert!(!Tile::Source(Protein::B).is_solid());
        assert_eq!(Tile::Source(Protein::B).type_name(), "B");
        assert_eq!(Proteins([1, 2, 3, 4]).to_string(), "1 2 3 4");
    }
}
