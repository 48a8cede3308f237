//! # Grid Clash Server Library
//!
//! Authoritative server for a UDP grid-claiming game. Players claim cells of
//! a square grid; the first full board ends the game and the player with the
//! most cells wins.
//!
//! ## Replication
//!
//! The interesting part is how the grid reaches the clients. The transport is
//! plain UDP: datagrams can be lost, duplicated or reordered, and nothing is
//! ever retransmitted. Instead, once per tick the server:
//!
//! 1. archives a copy of the live grid under a new snapshot id
//! 2. looks up the newest snapshot each client acknowledged
//! 3. sends the delta from that snapshot to the current grid, or the full
//!    grid if the client never acknowledged anything or its acknowledgment
//!    has dropped out of the archive
//!
//! Clients acknowledge every tick they apply, so a client that loses packets
//! is simply served a larger delta (or a full snapshot) on the next tick.
//!
//! ## Module Organization
//!
//! - `game`: grid, scores and the lobby/playing/finished phase machine
//! - `history`: bounded snapshot archive with oldest-first eviction
//! - `client_manager`: per-client address, player id and last acknowledged snapshot
//! - `session`: the single lock domain holding all of the above, lobby handling
//!   and per-tick planning
//! - `broadcast`: strategy selection and payload construction
//! - `ingress`: routing of inbound moves and acknowledgments
//! - `network`: socket tasks and the fixed-rate broadcast loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client_manager;
pub mod config;
pub mod game;
pub mod history;
pub mod ingress;
pub mod network;
pub mod session;
