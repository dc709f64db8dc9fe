//! Grid coordinates and compass directions shared by the grid games.
//!
//! Screen convention: `x` grows to the right, `y` grows downward.

use serde::{Deserialize, Serialize};

/// A cell coordinate. Signed so that off-grid neighbours are representable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[must_use]
    pub fn step(self, dir: Dir) -> Self {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }

    #[must_use]
    pub fn in_bounds(self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.x < width && self.y >= 0 && self.y < height
    }

    /// Manhattan distance.
    #[must_use]
    pub fn manhattan(self, other: GridPos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    #[must_use]
    pub fn is_adjacent(self, other: GridPos) -> bool {
        self.manhattan(other) == 1
    }

    /// Euclidean distance, used by the warmer/colder hint.
    #[must_use]
    pub fn distance(self, other: GridPos) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Row-major index into a `width`-wide grid. Caller checks bounds first.
    #[must_use]
    pub fn index(self, width: i32) -> usize {
        (self.y * width + self.x) as usize
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Facing direction of an organ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dir {
    #[default]
    N,
    E,
    S,
    W,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::N, Dir::E, Dir::S, Dir::W];

    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Dir::N => (0, -1),
            Dir::E => (1, 0),
            Dir::S => (0, 1),
            Dir::W => (-1, 0),
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Dir::N => 'N',
            Dir::E => 'E',
            Dir::S => 'S',
            Dir::W => 'W',
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Dir> {
        match token {
            "N" => Some(Dir::N),
            "E" => Some(Dir::E),
            "S" => Some(Dir::S),
            "W" => Some(Dir::W),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_and_bounds() {
        let p = GridPos::new(0, 0);
        assert_eq!(p.step(Dir::E), GridPos::new(1, 0));
        assert!(!p.step(Dir::N).in_bounds(3, 3));
        assert!(p.step(Dir::S).in_bounds(3, 3));
    }

    #[test]
    fn test_adjacency_is_four_connected() {
        let p = GridPos::new(2, 2);
        assert!(p.is_adjacent(GridPos::new(2, 3)));
        assert!(!p.is_adjacent(GridPos::new(3, 3)));
        assert!(!p.is_adjacent(p));
    }

    #[test]
    fn test_dir_parse() {
        for dir in Dir::ALL {
            assert_eq!(Dir::parse(&dir.to_string()), Some(dir));
        }
        assert_eq!(Dir::parse("X"), None);
    }
}
