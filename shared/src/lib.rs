//! Types shared by the grid clash server and client: the board, the diff
//! engine and the datagram format.

pub mod grid;
pub mod packet;

pub use grid::{diff, Cell, Change, Grid, UNCLAIMED};
pub use packet::{MsgType, Packet, Payload, PlayerId, SnapshotId};

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const PROTOCOL_VERSION: u8 = 1;
pub const GRID_SIZE: usize = 20;
pub const MAX_PLAYERS: usize = 4;
pub const HISTORY_LEN: usize = 50;
pub const DEFAULT_PORT: u16 = 12000;
pub const TICK_INTERVAL_MS: u64 = 50;

/// Largest payload a single UDP datagram can carry.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to decode packet: {0}")]
    Decode(String),
    #[error("failed to encode packet: {0}")]
    Encode(String),
    #[error("protocol version mismatch (expected {expected}, got {actual})")]
    VersionMismatch { expected: u8, actual: u8 },
    #[error("grid carries {actual} cells, expected {expected}")]
    GridSize { expected: usize, actual: usize },
    #[error("cell ({row}, {col}) outside a {size}x{size} grid")]
    CellOutOfRange { row: u16, col: u16, size: usize },
}

/// Current wall-clock time in milliseconds since the UNIX epoch.
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}
