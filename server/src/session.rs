//! The server's single mutual-exclusion domain.
//!
//! Grid, scores, snapshot archive and client directory are read and written
//! by both the ingress task and the broadcast loop, so they live together
//! behind one lock.

use crate::broadcast::{select_strategy, Strategy, Target, TickPlan, LIVE_UPDATE_MESSAGE};
use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::game::{GamePhase, GameState};
use crate::history::SnapshotHistory;
use log::{debug, info};
use shared::{Packet, Payload, PlayerId, SnapshotId};
use std::net::SocketAddr;

pub const GAME_START_MESSAGE: &str = "Grid clash starting";

/// A packet addressed to one client.
pub type Outbound = (SocketAddr, Packet);

pub struct Session {
    pub game: GameState,
    pub clients: ClientManager,
    pub history: SnapshotHistory,
    next_snapshot_id: SnapshotId,
}

impl Session {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            game: GameState::new(config.grid_size, config.max_players),
            clients: ClientManager::new(config.max_players),
            history: SnapshotHistory::new(config.history_len),
            next_snapshot_id: 0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.game.phase()
    }

    /// Id the next broadcast tick will carry.
    pub fn next_snapshot_id(&self) -> SnapshotId {
        self.next_snapshot_id
    }

    /// Handles contact from `addr` while the lobby is open. New addresses get
    /// a seat; the game starts as soon as the last seat is taken. Everyone is
    /// told the new lobby status.
    pub fn register_contact(&mut self, addr: SocketAddr) -> Vec<Outbound> {
        if self.game.phase() != GamePhase::Lobby {
            return Vec::new();
        }
        if self.clients.add_client(addr).is_none() {
            return Vec::new();
        }
        if self.clients.is_full() && self.game.start() {
            info!("All {} players connected", self.clients.len());
        }
        self.lobby_packets()
    }

    /// Periodic lobby re-announcement; empty once the game has started.
    pub fn lobby_announcements(&self) -> Vec<Outbound> {
        if self.game.phase() != GamePhase::Lobby {
            return Vec::new();
        }
        self.lobby_packets()
    }

    /// Lobby status for a single registered client, used to answer repeated
    /// hellos from a client that missed its seat assignment.
    pub fn lobby_status_for(&self, addr: SocketAddr) -> Option<Outbound> {
        let id = self.clients.find_client_by_addr(addr)?;
        Some((addr, self.lobby_packet(id)))
    }

    fn lobby_packets(&self) -> Vec<Outbound> {
        self.clients
            .get_client_addrs()
            .into_iter()
            .map(|(id, addr)| (addr, self.lobby_packet(id)))
            .collect()
    }

    fn lobby_packet(&self, player_id: PlayerId) -> Packet {
        let game_ready = self.game.phase() != GamePhase::Lobby;
        let message = if game_ready {
            GAME_START_MESSAGE.to_string()
        } else {
            format!("Waiting for {} players", self.clients.remaining_seats())
        };
        Packet::new(
            None,
            Payload::Lobby {
                game_ready,
                message,
                player_id,
            },
        )
    }

    /// Archives the live grid under a fresh snapshot id and decides how every
    /// client is served this tick. Once the game is finished every client gets
    /// the full final grid.
    pub fn plan_tick(&mut self) -> TickPlan {
        let snapshot_id = self.next_snapshot_id;
        self.next_snapshot_id += 1;

        let current = self.game.grid().clone();
        self.history.record(snapshot_id, &current);

        let finished = self.game.is_finished();
        let targets: Vec<Target> = self
            .clients
            .clients()
            .iter()
            .map(|client| {
                let strategy = if finished {
                    Strategy::FullSnapshot
                } else {
                    select_strategy(client.last_acked, snapshot_id, &self.history)
                };
                debug!(
                    "Tick {}: player {} (acked {:?}) -> {:?}",
                    snapshot_id, client.id, client.last_acked, strategy
                );
                let base = match strategy {
                    Strategy::DeltaFromHistory { base } => self.history.get(base).cloned(),
                    _ => None,
                };
                Target {
                    player_id: client.id,
                    addr: client.addr,
                    strategy,
                    base,
                }
            })
            .collect();

        let previous = if targets
            .iter()
            .any(|t| t.strategy == Strategy::DeltaFromPrevious)
        {
            snapshot_id
                .checked_sub(1)
                .and_then(|prev| self.history.get(prev))
                .cloned()
        } else {
            None
        };

        let message = self
            .game
            .winner_message()
            .unwrap_or_else(|| LIVE_UPDATE_MESSAGE.to_string());

        TickPlan {
            snapshot_id,
            current,
            previous,
            targets,
            game_ongoing: !finished,
            message,
        }
    }
}
