//! Secure channel state and the write path.

use crate::config::SecureConnectionParams;
use crate::error::{Error, Result};
use crate::framing::Frame;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;
use ua_transport::Transport;
use ua_types::ServiceRequest;
use ua_types::frame::{Acknowledge, MessageType, SequenceHeader, SymmetricAlgorithmHeader};
use ua_types::service::secure_channel::ChannelSecurityToken;

/// The secure channel over one transport.
///
/// Holds the current security token and the per-connection counters, and
/// serializes writers so that frames never interleave on the wire. The
/// token is read on every write; renewing it only replaces the stored
/// value.
pub(crate) struct SecureChannel {
    transport: Arc<dyn Transport>,
    params: SecureConnectionParams,
    token: RwLock<ChannelSecurityToken>,
    write_lock: tokio::sync::Mutex<()>,
    sequence_number: AtomicU32,
    request_id: AtomicU32,
    /// Largest frame the server accepts, zero for no limit.
    send_limit: usize,
}

impl SecureChannel {
    pub fn new(
        transport: Arc<dyn Transport>,
        params: SecureConnectionParams,
        acknowledge: &Acknowledge,
    ) -> Self {
        Self {
            transport,
            params,
            token: RwLock::new(ChannelSecurityToken::default()),
            write_lock: tokio::sync::Mutex::new(()),
            sequence_number: AtomicU32::new(1),
            request_id: AtomicU32::new(1),
            send_limit: acknowledge.receive_buffer_size as usize,
        }
    }

    pub const fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn token(&self) -> ChannelSecurityToken {
        self.token.read().clone()
    }

    pub fn set_token(&self, token: ChannelSecurityToken) {
        *self.token.write() = token;
    }

    /// Frame `request` and write it.
    ///
    /// `OPN` frames carry the asymmetric algorithm header, everything else
    /// the id of the current token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`] if the frame exceeds what the
    /// server accepts and [`Error::Send`] if the transport write fails.
    pub async fn write<R: ServiceRequest>(&self, request: &R) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let (channel_id, token_id) = {
            let token = self.token.read();
            (token.channel_id, token.token_id)
        };

        // Counters only move under the write lock, so frames leave in
        // sequence order.
        let sequence = SequenceHeader {
            sequence_number: self.sequence_number.load(Ordering::Relaxed),
            request_id: self.request_id.load(Ordering::Relaxed),
        };

        let frame = if R::MESSAGE_TYPE == MessageType::Open {
            Frame::secure(
                MessageType::Open,
                channel_id,
                &self.params.asymmetric_header(),
                &sequence,
                R::TYPE_ID,
                request,
            )
        } else {
            Frame::secure(
                R::MESSAGE_TYPE,
                channel_id,
                &SymmetricAlgorithmHeader { token_id },
                &sequence,
                R::TYPE_ID,
                request,
            )
        };

        if self.send_limit != 0 && frame.wire_len() > self.send_limit {
            return Err(Error::MessageTooLarge {
                size: frame.wire_len(),
                max: self.send_limit,
            });
        }

        self.sequence_number.fetch_add(1, Ordering::Relaxed);
        self.request_id.fetch_add(1, Ordering::Relaxed);

        trace!(
            "Writing {:?} frame: {} bytes, sequence {}, handle {}",
            R::MESSAGE_TYPE,
            frame.wire_len(),
            sequence.sequence_number,
            request.request_header().request_handle
        );

        self.transport
            .send(frame.to_bytes())
            .await
            .map_err(Error::Send)
    }
}
