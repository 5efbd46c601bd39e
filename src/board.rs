use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::moves::{Direction, MoveOutcome, OriginMap, TileOrigin};

/// Largest supported board edge. Grids keep their cells inline in a
/// `MAX_SIZE`×`MAX_SIZE` buffer so that copying a state never allocates.
pub const MAX_SIZE: usize = 8;
pub const MIN_SIZE: usize = 2;
pub const DEFAULT_SIZE: usize = 4;

/// Probability that a spawned tile is a 2 rather than a 4.
pub const SPAWN_TWO_PROBABILITY: f64 = 0.9;

/// (row, col), row 0 at the top.
pub type Pos = (usize, usize);

/// Platform-appropriate random number in [0, 1).
/// Uses js_sys::Math::random() in WASM builds, rand crate natively.
pub(crate) fn random_f64() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Math::random()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use rand::Rng;
        rand::thread_rng().gen::<f64>()
    }
}

/// Largest tile a grid may hold. Two of them never merge, so a doubled
/// value always fits in a `u32`.
pub const MAX_TILE: u32 = 1 << 30;

pub fn is_valid_tile(value: u32) -> bool {
    (2..=MAX_TILE).contains(&value) && value.is_power_of_two()
}

/// Rejected external grid data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("grid size {0} is outside the supported range {MIN_SIZE}..={MAX_SIZE}")]
    BadSize(usize),
    #[error("row {row} has {len} cells but the grid is {size} wide")]
    RaggedRow { row: usize, len: usize, size: usize },
    #[error("cell ({row}, {col}) holds {value}, which is not a power of two in 2..={MAX_TILE}")]
    BadTile { row: usize, col: usize, value: u32 },
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Option<u32>>>", into = "Vec<Vec<Option<u32>>>")]
pub struct Grid {
    size: usize,
    cells: [[Option<u32>; MAX_SIZE]; MAX_SIZE],
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

impl Grid {
    /// An empty `size`×`size` grid.
    pub fn new(size: usize) -> Self {
        Self::filled(size, None)
    }

    /// A `size`×`size` grid with every cell set to `fill`.
    pub fn filled(size: usize, fill: Option<u32>) -> Self {
        assert!((MIN_SIZE..=MAX_SIZE).contains(&size), "grid size {size} out of range");
        if let Some(value) = fill {
            assert!(is_valid_tile(value), "{value} is not a valid tile");
        }
        let mut cells = [[None; MAX_SIZE]; MAX_SIZE];
        for row in cells.iter_mut().take(size) {
            for cell in row.iter_mut().take(size) {
                *cell = fill;
            }
        }
        Grid { size, cells }
    }

    /// Build a grid from external rows, checking every invariant.
    pub fn from_rows<R: AsRef<[Option<u32>]>>(rows: &[R]) -> Result<Self, GridError> {
        let size = rows.len();
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            return Err(GridError::BadSize(size));
        }
        let mut grid = Grid::new(size);
        for (row, cells) in rows.iter().enumerate() {
            let cells = cells.as_ref();
            if cells.len() != size {
                return Err(GridError::RaggedRow { row, len: cells.len(), size });
            }
            for (col, &cell) in cells.iter().enumerate() {
                if let Some(value) = cell {
                    if !is_valid_tile(value) {
                        return Err(GridError::BadTile { row, col, value });
                    }
                }
                grid.cells[row][col] = cell;
            }
        }
        Ok(grid)
    }

    /// Like [`Grid::from_rows`] with 0 marking an empty cell.
    pub fn from_values<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, GridError> {
        let rows: Vec<Vec<Option<u32>>> = rows
            .iter()
            .map(|r| r.as_ref().iter().map(|&v| (v != 0).then_some(v)).collect())
            .collect();
        Self::from_rows(&rows)
    }

    pub fn rows(&self) -> Vec<Vec<Option<u32>>> {
        (0..self.size).map(|r| self.cells[r][..self.size].to_vec()).collect()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        assert!(
            row < self.size && col < self.size,
            "({row}, {col}) is off a {0}x{0} grid",
            self.size
        );
        self.cells[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, tile: Option<u32>) {
        assert!(
            row < self.size && col < self.size,
            "({row}, {col}) is off a {0}x{0} grid",
            self.size
        );
        if let Some(value) = tile {
            assert!(is_valid_tile(value), "{value} is not a valid tile");
        }
        self.cells[row][col] = tile;
    }

    /// Occupied cells in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (Pos, u32)> + '_ {
        self.positions()
            .filter_map(move |(r, c)| self.cells[r][c].map(|v| ((r, c), v)))
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = Pos> + '_ {
        self.positions().filter(move |&(r, c)| self.cells[r][c].is_none())
    }

    fn positions(&self) -> impl Iterator<Item = Pos> {
        let size = self.size;
        (0..size).flat_map(move |r| (0..size).map(move |c| (r, c)))
    }

    pub fn empty_count(&self) -> usize {
        self.empty_cells().count()
    }

    pub fn is_full(&self) -> bool {
        self.empty_cells().next().is_none()
    }

    pub fn max_tile(&self) -> Option<u32> {
        self.tiles().map(|(_, v)| v).max()
    }

    pub fn tile_sum(&self) -> u64 {
        self.tiles().map(|(_, v)| v as u64).sum()
    }

    /// Spawn a tile on a uniformly chosen empty cell: a 2 with probability
    /// 0.9, otherwise a 4. Returns the cell, or `None` if the grid is full.
    pub fn add_random_tile(&mut self) -> Option<Pos> {
        self.add_random_tile_with(random_f64)
    }

    /// [`Grid::add_random_tile`] drawing from `roll`, which must yield
    /// values in [0, 1). It is called twice: cell, then value.
    pub fn add_random_tile_with(&mut self, mut roll: impl FnMut() -> f64) -> Option<Pos> {
        let empty = self.empty_count();
        if empty == 0 {
            return None;
        }
        let index = ((roll() * empty as f64) as usize).min(empty - 1);
        let (row, col) = self.empty_cells().nth(index)?;
        let value = if roll() < SPAWN_TWO_PROBABILITY { 2 } else { 4 };
        self.cells[row][col] = Some(value);
        Some((row, col))
    }

    /// True if an empty cell exists or two orthogonal neighbours are equal
    /// and below [`MAX_TILE`].
    pub fn can_move(&self) -> bool {
        for row in 0..self.size {
            for col in 0..self.size {
                let Some(value) = self.cells[row][col] else {
                    return true;
                };
                if value == MAX_TILE {
                    continue;
                }
                if col + 1 < self.size && self.cells[row][col + 1] == Some(value) {
                    return true;
                }
                if row + 1 < self.size && self.cells[row + 1][col] == Some(value) {
                    return true;
                }
            }
        }
        false
    }
}

impl TryFrom<Vec<Vec<Option<u32>>>> for Grid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<Option<u32>>>) -> Result<Self, Self::Error> {
        Grid::from_rows(&rows)
    }
}

impl From<Grid> for Vec<Vec<Option<u32>>> {
    fn from(grid: Grid) -> Self {
        grid.rows()
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

/// Tab-separated rows, `-` for empty cells.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            for col in 0..self.size {
                match self.cells[row][col] {
                    Some(v) => write!(f, "{v}\t")?,
                    None => f.write_str("-\t")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Default)]
pub struct GameState {
    pub grid: Grid,
    pub score: u64,
}

impl GameState {
    pub fn new(size: usize) -> Self {
        GameState {
            grid: Grid::new(size),
            score: 0,
        }
    }

    pub fn with_grid(grid: Grid) -> Self {
        GameState { grid, score: 0 }
    }

    /// Slide and merge every tile towards `direction`, recording where
    /// each resulting tile came from. The state is left untouched when
    /// nothing can move.
    pub fn move_tiles(&mut self, direction: Direction) -> MoveOutcome {
        let mut origins = OriginMap::new(self.grid.size);
        let delta = self.resolve(direction, Some(&mut origins));
        MoveOutcome {
            moved: delta.is_some(),
            origins,
            score_delta: delta.unwrap_or(0),
        }
    }

    /// Same as [`GameState::move_tiles`] without origin tracking. Returns
    /// the score gained, or `None` if the move changed nothing.
    pub fn slide(&mut self, direction: Direction) -> Option<u64> {
        self.resolve(direction, None)
    }

    pub fn can_move(&self) -> bool {
        self.grid.can_move()
    }

    fn resolve(
        &mut self,
        direction: Direction,
        mut origins: Option<&mut OriginMap>,
    ) -> Option<u64> {
        let size = self.grid.size;
        let cells = &mut self.grid.cells;
        let mut moved = false;
        let mut delta = 0u64;

        for line in 0..size {
            // Write cursor, counted from the leading edge.
            let mut target = 0;
            for step in 1..size {
                let from = direction.cell(size, line, step);
                let Some(tile) = cells[from.0][from.1] else {
                    continue;
                };
                let to = direction.cell(size, line, target);
                match cells[to.0][to.1] {
                    None => {
                        cells[to.0][to.1] = Some(tile);
                        cells[from.0][from.1] = None;
                        if let Some(map) = origins.as_deref_mut() {
                            map.set(to, TileOrigin::Moved { from });
                        }
                        moved = true;
                    }
                    Some(existing) if existing == tile && tile < MAX_TILE => {
                        let merged = tile * 2;
                        cells[to.0][to.1] = Some(merged);
                        cells[from.0][from.1] = None;
                        if let Some(map) = origins.as_deref_mut() {
                            let first = match map.get(to.0, to.1) {
                                Some(TileOrigin::Moved { from }) => from,
                                _ => to,
                            };
                            let sources = [(first, existing), (from, tile)];
                            map.set(to, TileOrigin::Merged { sources });
                        }
                        delta += merged as u64;
                        moved = true;
                        // The merged tile is final for this move.
                        target += 1;
                    }
                    Some(_) => {
                        target += 1;
                        if target != step {
                            let dest = direction.cell(size, line, target);
                            cells[dest.0][dest.1] = Some(tile);
                            cells[from.0][from.1] = None;
                            if let Some(map) = origins.as_deref_mut() {
                                map.set(dest, TileOrigin::Moved { from });
                            }
                            moved = true;
                        }
                    }
                }
            }
        }

        if moved {
            self.score += delta;
            Some(delta)
        } else {
            None
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "score: {}", self.score)?;
        write!(f, "{}", self.grid)
    }
}
