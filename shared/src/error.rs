//! Error types for framing and message decoding

use thiserror::Error;

/// A frame was delimited correctly but its payload is unusable
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    #[error("frame payload of {len} bytes is not valid UTF-8")]
    InvalidUtf8 { len: usize },
}

/// A payload could not be turned into a typed [`Message`](crate::Message)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty payload")]
    Empty,

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("{kind} message is missing field {index}")]
    MissingField { kind: &'static str, index: usize },

    /// A field expected to be numeric did not parse
    #[error("malformed {field} field: {value:?}")]
    MalformedField { field: &'static str, value: String },

    #[error("unpaired field in {kind} list")]
    UnpairedField { kind: &'static str },
}
