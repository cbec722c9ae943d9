//! Error types for the binary codec.

use thiserror::Error;

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors raised while decoding binary protocol data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The buffer ended before the value was complete.
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes required by the value being decoded.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// Unknown node id encoding byte.
    #[error("invalid node id encoding: {0:#04x}")]
    InvalidNodeIdEncoding(u8),

    /// A length prefix that cannot be satisfied by the remaining data.
    #[error("invalid length {length} for {what}")]
    InvalidLength {
        /// What was being decoded.
        what: &'static str,
        /// The declared length.
        length: i64,
    },

    /// An enumeration carried a value outside its domain.
    #[error("invalid value {value} for enumeration {type_name}")]
    InvalidEnumValue {
        /// Name of the enumeration type.
        type_name: &'static str,
        /// The raw value received.
        value: i32,
    },

    /// A variant carried a type id this codec does not handle.
    #[error("unsupported variant type id {0}")]
    InvalidVariantType(u8),

    /// Frame header carried an unknown message type.
    #[error("invalid message type {0:?}")]
    InvalidMessageType([u8; 3]),

    /// Frame header carried an unknown chunk type.
    #[error("invalid chunk type {0:#04x}")]
    InvalidChunkType(u8),

    /// A string was not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// A recursive structure nested deeper than the decoder allows.
    #[error("{what} nested deeper than {max} levels")]
    NestingTooDeep {
        /// What was being decoded.
        what: &'static str,
        /// The deepest nesting accepted.
        max: usize,
    },
}

/// Error returned when parsing the text form of a node id fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid node id `{input}`: {reason}")]
pub struct ParseNodeIdError {
    /// The text that failed to parse.
    pub input: String,
    /// Why it was rejected.
    pub reason: &'static str,
}
