//! Display seam between the mirror grid and whatever shows it.

use log::{debug, info};
use shared::{Change, Grid, UNCLAIMED};

/// Receives every visible change the reconstructor makes.
pub trait GridView {
    fn apply_full_grid(&mut self, grid: &Grid);
    fn apply_changes(&mut self, changes: &[Change]);
    fn render_status(&mut self, text: &str);
}

/// Headless view that reports through the log.
#[derive(Debug, Default)]
pub struct LogView {
    cells_changed: usize,
}

impl LogView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total cells patched by deltas so far.
    pub fn cells_changed(&self) -> usize {
        self.cells_changed
    }
}

impl GridView for LogView {
    fn apply_full_grid(&mut self, grid: &Grid) {
        debug!("Full grid: {} cells claimed", grid.claimed_count());
    }

    fn apply_changes(&mut self, changes: &[Change]) {
        self.cells_changed += changes.len();
        for change in changes {
            debug!(
                "Cell ({}, {}) -> player {}",
                change.row, change.col, change.value
            );
        }
    }

    fn render_status(&mut self, text: &str) {
        info!("{}", text);
    }
}

/// Text rendering of a grid: `.` for unclaimed cells, the 1-based player
/// number otherwise.
pub fn render_board(grid: &Grid) -> String {
    grid.rows()
        .map(|row| {
            row.iter()
                .map(|&cell| match cell {
                    UNCLAIMED => '.',
                    v if v < 10 => char::from(b'0' + v),
                    _ => '#',
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
