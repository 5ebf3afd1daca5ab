//! # Drawing Game Host
//!
//! The host side of a multiplayer draw-and-guess game. One process owns the
//! authoritative state: registered accounts and their scores, the word
//! corpus, who is currently online, and the single running round. Clients
//! connect over TCP and exchange text frames defined in the `shared` crate.
//!
//! ## Round Flow
//!
//! The operator logs in on the host console and becomes the drawing
//! authority. They request three candidate words, pick one, and draw; every
//! stroke is relayed to the clients. Clients chat, and any chat line equal to
//! one of the chosen word's spellings (ignoring case) wins the round. The
//! guesser receives a fixed award and the drawer an award that decays with
//! the time the round took.
//!
//! ## Module Organization
//!
//! - `store`: SQLite persistence for users and words
//! - `users`: accounts, salted password checks, the leaderboard
//! - `words`: the multilingual corpus and candidate selection
//! - `presence`: heartbeat aging and the online roster
//! - `round`: the round state machine and scoring formula
//! - `session`: dispatch of client messages and host commands
//! - `console`: parsing of operator commands from stdin
//! - `network`: TCP connections and the tick loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use server::session::Session;
//! use server::store::SqliteStore;
//! use server::users::UserList;
//! use server::words::WordList;
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let users = UserList::new(Box::new(SqliteStore::open_memory()?));
//!     let session = Session::new(users, WordList::default(), 3);
//!
//!     let mut server = Server::bind("127.0.0.1:12345", session, Duration::from_millis(16)).await?;
//!     let (_commands, command_rx) = mpsc::unbounded_channel();
//!     server.run(command_rx).await;
//!
//!     Ok(())
//! }
//! ```
//!
//! Failures never stop the host: bad frames are dropped, rejected logins and
//! registrations are answered with failure responses, and storage errors are
//! logged while the in-memory state carries on.

pub mod console;
pub mod error;
pub mod network;
pub mod presence;
pub mod round;
pub mod session;
pub mod store;
pub mod users;
pub mod words;
