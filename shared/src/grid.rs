//! The claimable board and the diff engine that drives delta replication.
//!
//! A cell holds `0` while unclaimed and `player_id + 1` once claimed. Claims
//! are permanent, which is what makes a delta computed against any older
//! snapshot safe to apply on top of a newer mirror.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// Value stored in a single grid cell.
pub type Cell = u8;

/// Value of a cell nobody has claimed yet.
pub const UNCLAIMED: Cell = 0;

/// One cell transition between two grid states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub row: u16,
    pub col: u16,
    pub value: Cell,
}

impl Change {
    /// Builds a change from grid coordinates. Coordinates must fit in a `u16`.
    pub fn new(row: usize, col: usize, value: Cell) -> Self {
        Self {
            row: row as u16,
            col: col as u16,
            value,
        }
    }
}

/// Square board stored row-major.
///
/// Cloning performs a deep copy, so a cloned grid can be archived as a
/// snapshot without later moves leaking into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr", into = "GridRepr")]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

#[derive(Serialize, Deserialize)]
struct GridRepr {
    size: u16,
    cells: Vec<Cell>,
}

impl TryFrom<GridRepr> for Grid {
    type Error = ProtocolError;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        let size = usize::from(repr.size);
        if repr.cells.len() != size * size {
            return Err(ProtocolError::GridSize {
                expected: size * size,
                actual: repr.cells.len(),
            });
        }
        Ok(Grid {
            size,
            cells: repr.cells,
        })
    }
}

impl From<Grid> for GridRepr {
    fn from(grid: Grid) -> Self {
        GridRepr {
            size: grid.size as u16,
            cells: grid.cells,
        }
    }
}

impl Grid {
    /// Creates an all-unclaimed `size` x `size` grid.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![UNCLAIMED; size * size],
        }
    }

    /// Side length of the board.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells, `size * size`.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether `(row, col)` lies on the board.
    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// Value at `(row, col)`, or `None` outside the board.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if !self.in_bounds(row, col) {
            return None;
        }
        self.cells.get(row * self.size + col).copied()
    }

    /// Overwrites a cell. Returns false when the coordinates are outside the grid.
    pub fn set(&mut self, row: usize, col: usize, value: Cell) -> bool {
        if !self.in_bounds(row, col) {
            return false;
        }
        self.cells[row * self.size + col] = value;
        true
    }

    /// Number of cells owned by some player.
    pub fn claimed_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != UNCLAIMED).count()
    }

    /// Whether every cell has been claimed, which ends the game.
    pub fn is_full(&self) -> bool {
        self.claimed_count() == self.cells.len()
    }

    /// Coordinates of every unclaimed cell in row-major order.
    pub fn unclaimed_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == UNCLAIMED)
            .map(|(i, _)| (i / self.size, i % self.size))
            .collect()
    }

    /// Iterates over the board one row at a time, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        // chunks(0) panics, an empty grid simply has no rows
        self.cells.chunks(self.size.max(1))
    }

    /// Applies a change list. The whole list is validated before any cell is
    /// written, so a bad entry leaves the grid untouched.
    pub fn apply_changes(&mut self, changes: &[Change]) -> Result<(), ProtocolError> {
        if let Some(bad) = changes
            .iter()
            .find(|c| !self.in_bounds(usize::from(c.row), usize::from(c.col)))
        {
            return Err(ProtocolError::CellOutOfRange {
                row: bad.row,
                col: bad.col,
                size: self.size,
            });
        }

        for change in changes {
            self.set(usize::from(change.row), usize::from(change.col), change.value);
        }
        Ok(())
    }
}

/// Lists the cells of `new` that differ from `old`, in row-major order.
///
/// Both grids must share the same dimensions.
pub fn diff(old: &Grid, new: &Grid) -> Vec<Change> {
    debug_assert_eq!(old.size, new.size, "diffing grids of different sizes");

    old.cells
        .iter()
        .zip(new.cells.iter())
        .enumerate()
        .filter(|(_, (before, after))| before != after)
        .map(|(i, (_, &after))| Change::new(i / new.size, i % new.size, after))
        .collect()
}
