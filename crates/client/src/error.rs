//! Error types for the client engine.

use std::io;
use std::time::Duration;
use thiserror::Error;
use ua_transport::TransportError;
use ua_types::StatusCode;
use ua_types::frame::ChunkType;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed, or closed before the handshake completed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A frame whose declared size disagrees with what it contains.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// The peer sent an `ERR` frame.
    #[error("Protocol fault {status}: {reason}")]
    ProtocolFault {
        /// Status carried by the error frame.
        status: StatusCode,
        /// Reason text carried by the error frame.
        reason: String,
    },

    /// The server answered with a service fault or a bad service result.
    #[error("Service fault: {status}")]
    ServiceFault {
        /// The service result.
        status: StatusCode,
    },

    /// No response arrived in time.
    #[error("No response within {0:?}")]
    ResponseTimeout(Duration),

    /// Writing the request failed.
    #[error("Failed to send request: {0}")]
    Send(#[source] TransportError),

    /// A message body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] ua_types::DecodeError),

    /// The response type does not match the request.
    #[error("Unexpected response: expected type {expected}, got {actual}")]
    UnexpectedResponse {
        /// Encoding id of the expected response.
        expected: u32,
        /// Encoding id that arrived.
        actual: u32,
    },

    /// An outgoing frame is larger than the peer accepts.
    #[error("Message size {size} exceeds maximum {max}")]
    MessageTooLarge {
        /// Size of the frame.
        size: usize,
        /// Largest frame the peer accepts.
        max: usize,
    },

    /// Only single-chunk messages are supported.
    #[error("Unsupported chunk type: {0:?}")]
    UnsupportedChunk(ChunkType),

    /// The server closed the session.
    #[error("Session closed")]
    SessionClosed,

    /// The receive loop has stopped; the connection is unusable.
    #[error("Connection broken: {0}")]
    ConnectionBroken(String),

    /// The client is shutting down.
    #[error("Client is shutting down")]
    ShuttingDown,

    /// A completion slot was dropped without a response.
    #[error("Channel closed")]
    ChannelClosed,

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The notification worker could not be started.
    #[error("Failed to start notification worker: {0}")]
    Worker(#[source] io::Error),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Transport(TransportError::Io(error))
    }
}

impl Error {
    /// Returns `true` if the error leaves the connection unusable.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::MalformedFrame(_)
                | Self::ProtocolFault { .. }
                | Self::UnsupportedChunk(_)
                | Self::ConnectionBroken(_)
        )
    }
}
