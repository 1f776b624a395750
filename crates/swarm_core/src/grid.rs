//! Integer grid geometry.
//!
//! All positions are whole cells and all distances are squared integers,
//! so every comparison the engine makes is exact and deterministic.

use serde::{Deserialize, Serialize};

/// A cell position on the game grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct GridPos {
    /// Column (west to east).
    pub x: i32,
    /// Row (south to north).
    pub y: i32,
}

impl GridPos {
    /// Create a position at the given coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance to another cell.
    ///
    /// Squared distances avoid square roots entirely; every radius in the
    /// engine (vision, attack, broadcast) is expressed pre-squared.
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> u32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy) as u32
    }

    /// Check whether another cell is this cell or one of its 8 neighbors.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.distance_squared(other) <= 2
    }

    /// The cell one step in the given direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The compass direction that best approaches `target`.
    ///
    /// Returns `None` when the target is this cell.
    #[must_use]
    pub fn direction_to(self, target: Self) -> Option<Direction> {
        if self == target {
            return None;
        }
        let dx = (target.x - self.x).signum();
        let dy = (target.y - self.y).signum();
        Direction::from_offset(dx, dy)
    }

    /// All 8 neighboring cells, in [`Direction::ALL`] order.
    #[must_use]
    pub fn neighbors(self) -> [Self; 8] {
        let mut out = [self; 8];
        for (slot, dir) in out.iter_mut().zip(Direction::ALL) {
            *slot = slot.step(dir);
        }
        out
    }
}

/// One of the 8 compass directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// +y
    North,
    /// +x, +y
    Northeast,
    /// +x
    East,
    /// +x, -y
    Southeast,
    /// -y
    South,
    /// -x, -y
    Southwest,
    /// -x
    West,
    /// -x, +y
    Northwest,
}

impl Direction {
    /// All directions, clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::Northeast,
        Self::East,
        Self::Southeast,
        Self::South,
        Self::Southwest,
        Self::West,
        Self::Northwest,
    ];

    /// The (dx, dy) cell offset for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::Northeast => (1, 1),
            Self::East => (1, 0),
            Self::Southeast => (1, -1),
            Self::South => (0, -1),
            Self::Southwest => (-1, -1),
            Self::West => (-1, 0),
            Self::Northwest => (-1, 1),
        }
    }

    /// Look up a direction from a unit offset, if one matches.
    #[must_use]
    pub fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.offset() == (dx, dy))
    }
}

/// Integer square root, rounding down.
///
/// Used to recover a linear radius from the squared radii the oracle reports.
#[must_use]
pub fn isqrt(value: u32) -> u32 {
    if value < 2 {
        return value;
    }
    let mut x = value / 2;
    loop {
        let next = (x + value / x) / 2;
        if next >= x {
            return x;
        }
        x = next;
    }
}
