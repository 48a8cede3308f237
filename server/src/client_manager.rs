//! Replication directory: who is connected and what each client has confirmed
//!
//! Every client that makes contact during the lobby gets a record holding its
//! address, its player id (assigned in arrival order, starting at 0) and the
//! newest snapshot id it has acknowledged. Records are never removed; the game
//! has no disconnect handling.
//!
//! The acknowledged id only ever moves forward. ACKs travel over UDP like
//! everything else, so a stale or duplicated ACK can show up after a newer one
//! and must not roll the client's replication state back.

use log::{debug, info};
use shared::{PlayerId, SnapshotId};
use std::net::SocketAddr;

/// Replication state of a single client
#[derive(Debug, Clone)]
pub struct Client {
    /// Player id assigned by the server
    pub id: PlayerId,
    /// Network address for sending broadcasts
    pub addr: SocketAddr,
    /// Newest snapshot the client confirmed applying, `None` until the first ACK
    pub last_acked: Option<SnapshotId>,
}

impl Client {
    /// Creates a record for a freshly seated client that has not acknowledged anything yet.
    pub fn new(id: PlayerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_acked: None,
        }
    }

    /// Raises `last_acked` to `snapshot_id` if it is newer. Returns whether it moved.
    pub fn record_ack(&mut self, snapshot_id: SnapshotId) -> bool {
        match self.last_acked {
            Some(current) if snapshot_id <= current => false,
            _ => {
                self.last_acked = Some(snapshot_id);
                true
            }
        }
    }
}

/// All clients in arrival order, capped at the configured player count
pub struct ClientManager {
    clients: Vec<Client>,
    max_clients: usize,
}

impl ClientManager {
    /// Creates an empty directory with room for `max_clients` players.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: Vec::with_capacity(max_clients),
            max_clients,
        }
    }

    /// Registers a new address and returns its player id.
    ///
    /// An address that is already registered keeps its id. Returns `None`
    /// once every seat is taken.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<PlayerId> {
        if let Some(id) = self.find_client_by_addr(addr) {
            return Some(id);
        }
        if self.is_full() {
            return None;
        }

        let id = self.clients.len() as PlayerId;
        info!("Player {} connected from {}", id, addr);
        self.clients.push(Client::new(id, addr));
        Some(id)
    }

    /// Player id seated at `addr`, if any.
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<PlayerId> {
        self.clients.iter().find(|c| c.addr == addr).map(|c| c.id)
    }

    /// Whether `addr` holds a seat.
    pub fn contains(&self, addr: SocketAddr) -> bool {
        self.find_client_by_addr(addr).is_some()
    }

    /// Newest snapshot `addr` acknowledged, `None` if it never did (or is unknown).
    pub fn last_acked(&self, addr: SocketAddr) -> Option<SnapshotId> {
        self.clients
            .iter()
            .find(|c| c.addr == addr)
            .and_then(|c| c.last_acked)
    }

    /// Applies an ACK from `addr`. Stale, duplicate and unknown-sender ACKs
    /// are ignored; returns whether the record advanced.
    pub fn record_ack(&mut self, addr: SocketAddr, snapshot_id: SnapshotId) -> bool {
        match self.clients.iter_mut().find(|c| c.addr == addr) {
            Some(client) => {
                let advanced = client.record_ack(snapshot_id);
                if !advanced {
                    debug!(
                        "Ignoring stale ACK {} from player {} (at {:?})",
                        snapshot_id, client.id, client.last_acked
                    );
                }
                advanced
            }
            None => {
                debug!("ACK {} from unregistered address {}", snapshot_id, addr);
                false
            }
        }
    }

    /// All records in seat order.
    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// Player id and address of every seated client, in seat order.
    pub fn get_client_addrs(&self) -> Vec<(PlayerId, SocketAddr)> {
        self.clients.iter().map(|c| (c.id, c.addr)).collect()
    }

    /// Seats still open in the lobby.
    ///
    /// This is the `N` in the "Waiting for N players" announcement.
    pub fn remaining_seats(&self) -> usize {
        self.max_clients.saturating_sub(self.clients.len())
    }

    /// Whether every seat is taken, which is what starts the game.
    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Number of seated clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = Client::new(3, test_addr());
        assert_eq!(client.id, 3);
        assert_eq!(client.addr, test_addr());
        assert_eq!(client.last_acked, None);
    }

    #[test]
    fn test_ids_follow_arrival_order() {
        let mut manager = ClientManager::new(4);
        assert_eq!(manager.add_client(test_addr()), Some(0));
        assert_eq!(manager.add_client(test_addr2()), Some(1));
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.remaining_seats(), 2);
    }

    #[test]
    fn test_repeat_contact_keeps_id() {
        let mut manager = ClientManager::new(4);
        manager.add_client(test_addr());
        manager.add_client(test_addr2());
        assert_eq!(manager.add_client(test_addr()), Some(0));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = ClientManager::new(1);
        assert!(manager.add_client(test_addr()).is_some());
        assert!(manager.is_full());
        assert_eq!(manager.add_client(test_addr2()), None);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_find_client_by_addr() {
        let mut manager = ClientManager::new(2);
        manager.add_client(test_addr());

        assert_eq!(manager.find_client_by_addr(test_addr()), Some(0));
        let unknown: SocketAddr = "192.168.1.1:9999".parse().unwrap();
        assert_eq!(manager.find_client_by_addr(unknown), None);
        assert!(!manager.contains(unknown));
    }

    #[test]
    fn test_ack_only_moves_forward() {
        let mut manager = ClientManager::new(2);
        let addr = test_addr();
        manager.add_client(addr);
        assert_eq!(manager.last_acked(addr), None);

        assert!(manager.record_ack(addr, 5));
        assert_eq!(manager.last_acked(addr), Some(5));

        // reordered
        assert!(!manager.record_ack(addr, 3));
        assert_eq!(manager.last_acked(addr), Some(5));

        // duplicated
        assert!(!manager.record_ack(addr, 5));
        assert_eq!(manager.last_acked(addr), Some(5));

        assert!(manager.record_ack(addr, 9));
        assert_eq!(manager.last_acked(addr), Some(9));
    }

    #[test]
    fn test_ack_zero_is_valid() {
        let mut manager = ClientManager::new(1);
        manager.add_client(test_addr());
        assert!(manager.record_ack(test_addr(), 0));
        assert_eq!(manager.last_acked(test_addr()), Some(0));
    }

    #[test]
    fn test_ack_from_unknown_address() {
        let mut manager = ClientManager::new(2);
        manager.add_client(test_addr());
        assert!(!manager.record_ack(test_addr2(), 4));
        assert_eq!(manager.last_acked(test_addr2()), None);
        assert_eq!(manager.last_acked(test_addr()), None);
    }

    #[test]
    fn test_get_client_addrs() {
        let mut manager = ClientManager::new(3);
        manager.add_client(test_addr());
        manager.add_client(test_addr2());
        assert_eq!(
            manager.get_client_addrs(),
            vec![(0, test_addr()), (1, test_addr2())]
        );
    }
}
