use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::{Pos, MAX_SIZE};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// All four directions in their numeric order (0 = up, 1 = right, 2 = down, 3 = left).
    pub const ALL: [Direction; 4] =
        [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    pub fn index(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Direction> {
        Direction::ALL.get(index as usize).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }

    /// Map a (line, step) pair to a board cell. `line` selects the row or
    /// column perpendicular to the slide, `step` counts from the edge the
    /// tiles slide towards.
    pub(crate) fn cell(self, size: usize, line: usize, step: usize) -> Pos {
        match self {
            Direction::Up => (step, line),
            Direction::Down => (size - 1 - step, line),
            Direction::Left => (line, step),
            Direction::Right => (line, size - 1 - step),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = String;

    /// Accepts the label ("up"), its initial ("u") or the numeric index ("0").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" | "0" => Ok(Direction::Up),
            "right" | "r" | "1" => Ok(Direction::Right),
            "down" | "d" | "2" => Ok(Direction::Down),
            "left" | "l" | "3" => Ok(Direction::Left),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Where the tile now sitting in a cell came from.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TileOrigin {
    /// Slid here from another cell.
    Moved { from: Pos },
    /// Two tiles of equal value combined here.
    Merged { sources: [(Pos, u32); 2] },
    /// Placed by the random spawn after the move.
    Spawned,
}

/// Per-cell origin record for one move. Cells whose tile stayed put (or
/// that are empty) hold `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OriginMap {
    size: usize,
    cells: [[Option<TileOrigin>; MAX_SIZE]; MAX_SIZE],
}

impl OriginMap {
    pub fn new(size: usize) -> Self {
        assert!(size <= MAX_SIZE, "origin map size {size} exceeds {MAX_SIZE}");
        OriginMap {
            size,
            cells: [[None; MAX_SIZE]; MAX_SIZE],
        }
    }

    /// Every cell marked as spawned, as at the start of a game.
    pub fn all_spawned(size: usize) -> Self {
        let mut map = OriginMap::new(size);
        for row in 0..size {
            for col in 0..size {
                map.cells[row][col] = Some(TileOrigin::Spawned);
            }
        }
        map
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> Option<TileOrigin> {
        assert!(
            row < self.size && col < self.size,
            "({row}, {col}) is off a {0}x{0} map",
            self.size
        );
        self.cells[row][col]
    }

    pub fn set(&mut self, (row, col): Pos, origin: TileOrigin) {
        assert!(
            row < self.size && col < self.size,
            "({row}, {col}) is off a {0}x{0} map",
            self.size
        );
        self.cells[row][col] = Some(origin);
    }

    pub fn rows(&self) -> Vec<Vec<Option<TileOrigin>>> {
        (0..self.size).map(|r| self.cells[r][..self.size].to_vec()).collect()
    }
}

/// The result of resolving one move on a [`GameState`](crate::board::GameState).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: bool,
    pub origins: OriginMap,
    pub score_delta: u64,
}
