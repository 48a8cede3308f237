//! Per-tick replication: which payload each client gets and how it is built.
//!
//! The server never retransmits. Each tick it looks at the newest snapshot a
//! client acknowledged and serves whatever bridges the gap to the current
//! grid:
//!
//! - the client acked the previous tick: the shared tick-to-tick delta
//! - the client acked an older tick that is still archived: a delta rebased
//!   on that snapshot
//! - the client never acked, or its ack fell out of the archive: the full grid
//!
//! Planning happens under the session lock and only copies grids. Diffing is
//! done afterwards in [`TickPlan::into_packets`], outside the lock.

use crate::history::SnapshotHistory;
use shared::{diff, Grid, Packet, Payload, PlayerId, SnapshotId};
use std::net::SocketAddr;

pub const LIVE_UPDATE_MESSAGE: &str = "Live Update";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DeltaFromPrevious,
    DeltaFromHistory { base: SnapshotId },
    FullSnapshot,
}

/// Picks the payload kind for a client whose newest ACK is `last_acked`,
/// given that `snapshot_id` has just been recorded in `history`.
pub fn select_strategy(
    last_acked: Option<SnapshotId>,
    snapshot_id: SnapshotId,
    history: &SnapshotHistory,
) -> Strategy {
    let Some(acked) = last_acked else {
        return Strategy::FullSnapshot;
    };
    // an ack for the current or a future tick cannot be genuine; acks never
    // move back, so a peer that sends one stays on full snapshots for good
    if acked >= snapshot_id || !history.contains(acked) {
        return Strategy::FullSnapshot;
    }
    if acked + 1 == snapshot_id {
        Strategy::DeltaFromPrevious
    } else {
        Strategy::DeltaFromHistory { base: acked }
    }
}

#[derive(Debug, Clone)]
pub struct Target {
    pub player_id: PlayerId,
    pub addr: SocketAddr,
    pub strategy: Strategy,
    /// Archived grid for `DeltaFromHistory`
    pub base: Option<Grid>,
}

/// Everything needed to emit one tick, copied out of the shared state.
#[derive(Debug, Clone)]
pub struct TickPlan {
    pub snapshot_id: SnapshotId,
    pub current: Grid,
    /// Grid of the previous tick, present when some target needs it
    pub previous: Option<Grid>,
    pub targets: Vec<Target>,
    pub game_ongoing: bool,
    pub message: String,
}

impl TickPlan {
    /// Builds one packet per target, all tagged with this tick's snapshot id.
    pub fn into_packets(self) -> Vec<(SocketAddr, Packet)> {
        let TickPlan {
            snapshot_id,
            current,
            previous,
            targets,
            game_ongoing,
            message,
        } = self;

        let prev_changes = previous.as_ref().map(|prev| diff(prev, &current));

        targets
            .into_iter()
            .map(|target| {
                let payload = match (target.strategy, &prev_changes, &target.base) {
                    (Strategy::DeltaFromPrevious, Some(changes), _) => Payload::Delta {
                        changes: changes.clone(),
                        game_ongoing,
                    },
                    (Strategy::DeltaFromHistory { .. }, _, Some(base)) => Payload::Delta {
                        changes: diff(base, &current),
                        game_ongoing,
                    },
                    _ => Payload::Snapshot {
                        grid: current.clone(),
                        message: message.clone(),
                        game_ongoing,
                    },
                };
                (target.addr, Packet::new(Some(snapshot_id), payload))
            })
            .collect()
    }
}
