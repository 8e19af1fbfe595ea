//! # Arena Authority Library
//!
//! Authoritative session core for the networked arena game. The authority
//! owns every piece of canonical state: who is in the session, what they
//! are called and wearing, where they stand, how much health and score
//! they carry, and whether the session is still gathering in the lobby or
//! already in a match. Clients send requests; the authority validates,
//! commits, and replicates.
//!
//! ## Core Responsibilities
//!
//! ### Canonical State
//! Every observable value has exactly one writer. Clients never commit
//! state locally and wait for the authority's replication instead, so all
//! observers converge on the same session picture.
//!
//! ### Change-Driven Replication
//! Mutations that do not change canonical state produce no replication
//! traffic. Each mutator reports whether it committed, and only committed
//! values are broadcast, in the same order as the mutations themselves.
//!
//! ### Session Lifecycle
//! Handles the complete lifecycle of a participant: connect and identity
//! assignment, lobby readiness, the one-way transition into the match,
//! in-match simulation, and disconnect or timeout cleanup.
//!
//! ## Architecture Design
//!
//! A single-threaded event loop processes all requests sequentially,
//! which eliminates race conditions between participants and makes event
//! ordering trivially equal to mutation ordering. Networking runs on
//! dedicated async tasks (receiver, sender, timeout checker) that talk to
//! the loop over channels.
//!
//! ## Module Organization
//!
//! - [`roster`]: ordered participant list with names, ready flags, and
//!   color bindings
//! - [`colors`]: finite appearance color pool with queue-based recycling
//! - [`arena`]: per-player transform, health, score, and life state
//! - [`lobby`]: lobby card projection and the one-shot match transition
//! - [`chat`]: chat fan-out and the whisper protocol
//! - [`network`]: UDP transport, session table, and the authority loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(16),
//!         32,
//!     ).await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod arena;
pub mod chat;
pub mod colors;
pub mod lobby;
pub mod network;
pub mod roster;
