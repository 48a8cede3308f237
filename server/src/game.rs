//! Authoritative game state: the live grid, the score vector and the
//! lobby -> playing -> finished phase machine.

use log::info;
use shared::{Grid, PlayerId, UNCLAIMED};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Lobby,
    Playing,
    Finished,
}

/// Why a move was refused. The display text is what the mover sees.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("Cell already taken!")]
    CellTaken,
    #[error("Cell out of bounds!")]
    OutOfBounds,
    #[error("Game is not running!")]
    NotPlaying,
    #[error("Unknown player!")]
    UnknownPlayer,
}

pub const ACCEPTED_MESSAGE: &str = "Nice move!";

#[derive(Debug, Clone)]
pub struct GameState {
    grid: Grid,
    scores: Vec<u32>,
    claimed: usize,
    phase: GamePhase,
}

impl GameState {
    /// Creates an empty `grid_size` x `grid_size` board in the lobby phase.
    pub fn new(grid_size: usize, max_players: usize) -> Self {
        Self {
            grid: Grid::new(grid_size),
            scores: vec![0; max_players],
            claimed: 0,
            phase: GamePhase::Lobby,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Claimed-cell count per player, indexed by player id.
    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::Finished
    }

    /// Leaves the lobby. Returns false if the game had already started.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Lobby {
            return false;
        }
        self.phase = GamePhase::Playing;
        info!(
            "Game started on a {0}x{0} grid with {1} players",
            self.grid.size(),
            self.scores.len()
        );
        true
    }

    /// Claims `(row, col)` for `player_id`.
    ///
    /// The grid and scores are only touched when the move is accepted. The
    /// move that claims the last free cell ends the game.
    pub fn apply_move(
        &mut self,
        player_id: PlayerId,
        row: usize,
        col: usize,
    ) -> Result<(), MoveRejection> {
        if self.phase != GamePhase::Playing {
            return Err(MoveRejection::NotPlaying);
        }
        let player = usize::from(player_id);
        if player >= self.scores.len() {
            return Err(MoveRejection::UnknownPlayer);
        }
        match self.grid.get(row, col) {
            None => return Err(MoveRejection::OutOfBounds),
            Some(UNCLAIMED) => {}
            Some(_) => return Err(MoveRejection::CellTaken),
        }

        self.grid.set(row, col, player_id + 1);
        self.scores[player] += 1;
        self.claimed += 1;

        if self.claimed >= self.grid.cell_count() {
            self.phase = GamePhase::Finished;
            info!("All {} cells claimed, final scores {:?}", self.claimed, self.scores);
        }
        Ok(())
    }

    /// Highest scorer once the game is over; ties go to the lowest player id.
    pub fn winner(&self) -> Option<PlayerId> {
        if self.phase != GamePhase::Finished {
            return None;
        }
        let best = self.scores.iter().copied().max()?;
        self.scores
            .iter()
            .position(|&s| s == best)
            .map(|idx| idx as PlayerId)
    }

    /// Terminal status text, e.g. "Player 2 WON!". `None` while the game runs.
    pub fn winner_message(&self) -> Option<String> {
        self.winner().map(|id| format!("Player {} WON!", id + 1))
    }
}
