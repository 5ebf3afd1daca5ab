//! Wire protocol shared by the drawing host and its guessing clients
//!
//! The host and every client speak a line-free text protocol over TCP:
//! each message is wrapped as `!MSG` + payload + `MSG?`, and the payload is
//! a type tag followed by positional fields joined with `;;;`.
//!
//! - [`framing`] turns an arbitrarily chunked byte stream back into payloads.
//! - [`protocol`] converts payloads to and from typed [`Message`] values.

pub mod error;
pub mod framing;
pub mod protocol;

pub use error::{FramingError, ProtocolError};
pub use framing::{FrameBuffer, Frames};
pub use protocol::{is_reserved_username, AccountSummary, Message, Stroke};

pub const FRAME_START: &str = "!MSG";
pub const FRAME_END: &str = "MSG?";
pub const FIELD_SEPARATOR: &str = ";;;";

pub const DEFAULT_PORT: u16 = 12345;

/// Ticks without a heartbeat after which a user counts as gone
pub const HEARTBEAT_THRESHOLD: u32 = 100;

pub const POINTS_FOR_GUESS: u32 = 200;
pub const MAX_POINTS_FOR_DRAWING: u32 = 400;
pub const MIN_POINTS_FOR_DRAWING: u32 = 100;

/// Number of candidate words offered to the drawing authority
pub const WORD_CHOICES: usize = 3;

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn timestamp_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis().min(i64::MAX as u128) as i64)
        .unwrap_or(0)
}
