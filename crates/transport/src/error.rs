//! Error types for transports.

use thiserror::Error;

/// Transport layer errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream
    #[error("Connection closed")]
    ConnectionClosed,

    /// The transport was stopped locally
    #[error("Transport stopped")]
    Stopped,

    /// The address could not be parsed or resolved
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Connecting to the peer failed
    #[error("Failed to connect to {address}: {reason}")]
    ConnectFailed {
        /// Address that was dialled
        address: String,
        /// Why the connection failed
        reason: String,
    },
}
