//! Headless move source standing in for a click handler.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::Grid;

/// Picks random unclaimed cells from the client's mirror grid.
pub struct AutoPlayer {
    rng: StdRng,
}

impl AutoPlayer {
    /// A fixed seed makes the sequence of picks reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Returns `(row, col)` of some cell the mirror still shows as free.
    ///
    /// The mirror can lag the server, so the pick may still be rejected.
    pub fn pick_cell(&mut self, grid: &Grid) -> Option<(usize, usize)> {
        grid.unclaimed_cells().choose(&mut self.rng).copied()
    }
}
