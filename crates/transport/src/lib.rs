//! Byte-stream transport abstraction for the client engine.
//!
//! A transport moves raw bytes. Framing, correlation and security all live
//! above it. Specific transports (TCP, in-memory) are provided in separate
//! crates.

pub mod error;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

pub use error::TransportError;
pub use error::TransportError as Error;

/// Bidirectional byte stream with an explicit stop.
///
/// The client engine has exactly one reader (its receive task) and
/// serializes writers itself, so implementations only need to be safe for
/// one concurrent `receive` alongside one concurrent `send`.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Write all of `data` or fail.
    async fn send(&self, data: Bytes) -> Result<(), TransportError>;

    /// Read up to `buf.len()` bytes into `buf`.
    ///
    /// Returns the number of bytes read. Zero means the peer closed the
    /// stream in an orderly way.
    async fn receive(&self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Stop the transport. Idempotent. Any blocked `send` or `receive`
    /// returns [`TransportError::Stopped`] and later calls fail the same way.
    fn stop(&self);
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, data: Bytes) -> Result<(), TransportError> {
        (**self).send(data).await
    }

    async fn receive(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).receive(buf).await
    }

    fn stop(&self) {
        (**self).stop();
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, data: Bytes) -> Result<(), TransportError> {
        (**self).send(data).await
    }

    async fn receive(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).receive(buf).await
    }

    fn stop(&self) {
        (**self).stop();
    }
}
