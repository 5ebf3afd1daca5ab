//! # Drawing Game Client
//!
//! A terminal client for the draw-and-guess host. It connects over TCP,
//! keeps reconnecting while the host is unreachable, and turns typed lines
//! into account requests or chat. Everything the host broadcasts is applied
//! to a local [`session::ClientSession`] and the interesting parts are
//! printed.
//!
//! ## Module Organization
//!
//! - `input`: parsing `/login`, `/register` and chat lines from stdin
//! - `session`: correlation ids, login state, canvas, roster and leaderboard
//! - `network`: the connection, non-blocking reads and the tick loop
//!
//! Responses to account requests are broadcast to every client. Each client
//! picks a random correlation id at startup and only reacts to responses
//! carrying it.

pub mod error;
pub mod input;
pub mod network;
pub mod session;
