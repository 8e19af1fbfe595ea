//! # Arena Client Library
//!
//! Terminal client for the networked arena game. The client holds no
//! authority of its own: every observable value is a mirror of what the
//! authority replicated, applied verbatim and without local smoothing.
//! User input is translated into requests and sent upstream; the effect
//! only becomes visible once the authority commits and replicates it.
//!
//! ## Module Organization
//!
//! ### Mirror Module (`mirror`)
//! The replicated session cache: roster snapshots, per-player transforms
//! and colors, health and score, and the chat log. Applying a packet
//! yields typed change events the presentation layer reacts to.
//!
//! ### Input Module (`input`)
//! Terminal command parsing (`/ready`, `/name`, `/move`, chat lines) and
//! the per-frame movement sampler that caps outgoing traffic at one
//! movement and one rotation request per frame.
//!
//! ### Network Module (`network`)
//! UDP transport and the client event loop: socket receive, stdin lines,
//! and the frame timer, multiplexed on one task.

pub mod input;
pub mod mirror;
pub mod network;
