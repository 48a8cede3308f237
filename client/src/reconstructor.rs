//! Client-side mirror of the server grid.
//!
//! Tick packets carry either the whole grid or the cells that changed since
//! the snapshot this client last acknowledged. Either way, once applied the
//! mirror matches the server's grid at that tick, and the tick's id is handed
//! back to the caller to acknowledge.
//!
//! Ticks that are not newer than the last applied one are dropped. A late
//! full snapshot would otherwise wipe claims the mirror already shows, and
//! the server would never resend them because its record of this client only
//! moves forward.

use crate::view::GridView;
use log::{debug, info};
use shared::{Grid, Packet, Payload, PlayerId, ProtocolError, SnapshotId, GRID_SIZE};

pub struct Reconstructor {
    grid: Grid,
    my_id: Option<PlayerId>,
    last_applied: Option<SnapshotId>,
    status: String,
    game_started: bool,
    game_over: bool,
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new(GRID_SIZE)
    }
}

impl Reconstructor {
    /// Creates an all-unclaimed mirror. A SNAPSHOT of another size replaces it wholesale.
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid: Grid::new(grid_size),
            my_id: None,
            last_applied: None,
            status: String::from("Connecting..."),
            game_started: false,
            game_over: false,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Player id from the lobby, `None` until seated.
    pub fn my_id(&self) -> Option<PlayerId> {
        self.my_id
    }

    /// Newest tick applied to the mirror, i.e. the last id acknowledged.
    pub fn last_applied(&self) -> Option<SnapshotId> {
        self.last_applied
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn game_started(&self) -> bool {
        self.game_started
    }

    /// Set once a tick arrives with `game_ongoing = false`.
    pub fn game_over(&self) -> bool {
        self.game_over
    }

    /// Applies one packet from the server and returns the snapshot id to
    /// acknowledge, if any.
    ///
    /// A malformed tick leaves the mirror untouched and is reported as an
    /// error; the caller is expected to log and drop it.
    pub fn apply(
        &mut self,
        packet: Packet,
        view: &mut dyn GridView,
    ) -> Result<Option<SnapshotId>, ProtocolError> {
        let snapshot_id = packet.snapshot_id;

        match packet.payload {
            Payload::Lobby {
                game_ready,
                message,
                player_id,
            } => {
                if self.my_id.is_none() {
                    info!("Assigned player {}", player_id + 1);
                    self.my_id = Some(player_id);
                }
                if game_ready {
                    self.game_started = true;
                }
                self.set_status(message, view);
                Ok(None)
            }

            Payload::Info { message, .. } => {
                self.set_status(message, view);
                Ok(None)
            }

            Payload::Snapshot {
                grid,
                message,
                game_ongoing,
            } => {
                if self.is_stale(snapshot_id) {
                    return Ok(None);
                }
                self.grid = grid;
                view.apply_full_grid(&self.grid);
                self.set_status(message, view);
                Ok(self.finish_tick(snapshot_id, game_ongoing))
            }

            Payload::Delta {
                changes,
                game_ongoing,
            } => {
                if self.is_stale(snapshot_id) {
                    return Ok(None);
                }
                self.grid.apply_changes(&changes)?;
                view.apply_changes(&changes);
                Ok(self.finish_tick(snapshot_id, game_ongoing))
            }

            other => {
                debug!("Ignoring {} packet from server", other.msg_type());
                Ok(None)
            }
        }
    }

    fn is_stale(&self, snapshot_id: Option<SnapshotId>) -> bool {
        match (snapshot_id, self.last_applied) {
            (Some(id), Some(last)) if id <= last => {
                debug!("Dropping stale tick {} (applied {})", id, last);
                true
            }
            _ => false,
        }
    }

    fn finish_tick(
        &mut self,
        snapshot_id: Option<SnapshotId>,
        game_ongoing: bool,
    ) -> Option<SnapshotId> {
        self.game_started = true;
        if !game_ongoing {
            self.game_over = true;
        }
        if snapshot_id.is_some() {
            self.last_applied = snapshot_id;
        }
        snapshot_id
    }

    fn set_status(&mut self, message: String, view: &mut dyn GridView) {
        if message != self.status {
            view.render_status(&message);
            self.status = message;
        }
    }
}
