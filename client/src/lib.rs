//! # Grid Clash Client Library
//!
//! Client side of the grid clash game: it joins the lobby, keeps a mirror of
//! the server's grid up to date from snapshot and delta ticks, acknowledges
//! every tick it applies and optionally plays random moves on its own.
//!
//! ## Module Organization
//!
//! - `reconstructor`: applies ticks to the local mirror and decides what to acknowledge
//! - `view`: the seam a renderer plugs into, plus a logging implementation
//! - `latency`: one-way latency and jitter from server timestamps
//! - `autoplay`: seeded random move selection for headless play
//! - `network`: the UDP client tying everything together
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new(ClientConfig::default()).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod autoplay;
pub mod latency;
pub mod network;
pub mod reconstructor;
pub mod view;
