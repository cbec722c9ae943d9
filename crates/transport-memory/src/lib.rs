//! In-memory transport implementation for testing
//!
//! [`MemoryTransport::pair`] returns two connected ends of a duplex byte
//! stream living in the same process. Writes on one end become readable on
//! the other, in order, with no framing preserved.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use ua_transport::{Transport, TransportError};
use uuid::Uuid;

/// Writes that may be queued before `send` waits for the reader.
const CHANNEL_CAPACITY: usize = 100;

/// One end of an in-memory duplex stream
pub struct MemoryTransport {
    id: Uuid,
    sender: Mutex<Option<flume::Sender<Bytes>>>,
    receiver: flume::Receiver<Bytes>,
    pending: tokio::sync::Mutex<BytesMut>,
    stop: CancellationToken,
}

impl Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("id", &self.id)
            .field("stopped", &self.stop.is_cancelled())
            .finish()
    }
}

impl MemoryTransport {
    /// Create two connected ends
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_to_b_tx, a_to_b_rx) = flume::bounded(CHANNEL_CAPACITY);
        let (b_to_a_tx, b_to_a_rx) = flume::bounded(CHANNEL_CAPACITY);
        let id = Uuid::new_v4();

        debug!("Created memory transport pair {}", id);

        (Self::new(id, a_to_b_tx, b_to_a_rx), Self::new(id, b_to_a_tx, a_to_b_rx))
    }

    fn new(id: Uuid, sender: flume::Sender<Bytes>, receiver: flume::Receiver<Bytes>) -> Self {
        Self {
            id,
            sender: Mutex::new(Some(sender)),
            receiver,
            pending: tokio::sync::Mutex::new(BytesMut::new()),
            stop: CancellationToken::new(),
        }
    }

    /// Returns `true` once [`Transport::stop`] has been called on this end
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, data: Bytes) -> Result<(), TransportError> {
        if self.stop.is_cancelled() {
            return Err(TransportError::Stopped);
        }

        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or(TransportError::Stopped)?;

        debug!("Memory transport {} sending {} bytes", self.id, data.len());

        tokio::select! {
            biased;
            () = self.stop.cancelled() => Err(TransportError::Stopped),
            result = sender.send_async(data) => result.map_err(|_| TransportError::ConnectionClosed),
        }
    }

    async fn receive(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.stop.is_cancelled() {
            return Err(TransportError::Stopped);
        }

        let mut pending = self.pending.lock().await;
        if pending.is_empty() {
            let received = tokio::select! {
                biased;
                () = self.stop.cancelled() => return Err(TransportError::Stopped),
                received = self.receiver.recv_async() => received,
            };
            match received {
                Ok(data) => pending.extend_from_slice(&data),
                // Every sender of the peer is gone: orderly close.
                Err(_) => return Ok(0),
            }
        }

        let count = buf.len().min(pending.len());
        buf[..count].copy_from_slice(&pending.split_to(count));
        Ok(count)
    }

    fn stop(&self) {
        if self.stop.is_cancelled() {
            return;
        }
        debug!("Stopping memory transport {}", self.id);
        self.stop.cancel();
        // Dropping our sender lets the peer observe end of stream.
        self.sender.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_is_bidirectional() {
        let _ = tracing_subscriber::fmt::try_init();

        let (client, server) = MemoryTransport::pair();

        client.send(Bytes::from_static(b"hello")).await.unwrap();
        let mut buf = [0u8; 16];
        let n = server.receive(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");

        server.send(Bytes::from_static(b"back")).await.unwrap();
        let n = client.receive(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"back");
    }

    #[tokio::test]
    async fn test_small_reads_keep_the_remainder() {
        let _ = tracing_subscriber::fmt::try_init();

        let (client, server) = MemoryTransport::pair();
        client.send(Bytes::from_static(b"abcdef")).await.unwrap();

        let mut buf = [0u8; 4];
        let n = server.receive(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"abcd");
        let n = server.receive(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ef");
    }

    #[tokio::test]
    async fn test_stop_interrupts_blocked_receive() {
        let _ = tracing_subscriber::fmt::try_init();

        let (client, _server) = MemoryTransport::pair();
        let client = std::sync::Arc::new(client);

        let reader = {
            let client = client.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 8];
                client.receive(&mut buf).await
            })
        };

        tokio::task::yield_now().await;
        client.stop();
        client.stop();

        let result = reader.await.unwrap();
        assert!(matches!(result, Err(TransportError::Stopped)));
        assert!(matches!(
            client.send(Bytes::from_static(b"x")).await,
            Err(TransportError::Stopped)
        ));
    }

    #[tokio::test]
    async fn test_peer_stop_is_end_of_stream() {
        let _ = tracing_subscriber::fmt::try_init();

        let (client, server) = MemoryTransport::pair();
        server.stop();

        let mut buf = [0u8; 8];
        assert_eq!(client.receive(&mut buf).await.unwrap(), 0);
    }
}
