//! Hello / acknowledge exchange.

use crate::error::{Error, Result};
use crate::framing::{Frame, FrameReader};
use std::sync::Arc;
use tracing::{debug, instrument};
use ua_transport::{Transport, TransportError};
use ua_types::BinaryDecodable;
use ua_types::frame::{Acknowledge, ErrorMessage, Hello, MessageType};

/// Send `hello` and wait for the acknowledgement.
///
/// Runs once per connection before the receive loop starts, so it reads
/// from `reader` directly.
///
/// # Errors
///
/// - [`Error::Transport`] if the stream fails or closes first.
/// - [`Error::ProtocolFault`] if the server answers with an error frame.
/// - [`Error::MalformedFrame`] for any other frame.
#[instrument(skip_all, fields(endpoint = %hello.endpoint_url))]
pub(crate) async fn handshake(
    transport: &Arc<dyn Transport>,
    reader: &mut FrameReader,
    hello: &Hello,
) -> Result<Acknowledge> {
    transport
        .send(Frame::message(MessageType::Hello, hello).to_bytes())
        .await?;

    let frame = reader
        .next_frame()
        .await?
        .ok_or(Error::Transport(TransportError::ConnectionClosed))?;

    let mut payload = frame.payload;
    match frame.header.message_type {
        MessageType::Acknowledge => {
            let ack = Acknowledge::decode(&mut payload)
                .map_err(|e| Error::MalformedFrame(format!("Truncated acknowledge: {e}")))?;
            debug!(
                "Acknowledged: receive buffer {}, send buffer {}, max message {}",
                ack.receive_buffer_size, ack.send_buffer_size, ack.max_message_size
            );
            Ok(ack)
        }
        MessageType::Error => {
            let error = ErrorMessage::decode(&mut payload)
                .map_err(|e| Error::MalformedFrame(format!("Truncated error message: {e}")))?;
            Err(Error::ProtocolFault {
                status: error.error,
                reason: error.reason,
            })
        }
        other => Err(Error::MalformedFrame(format!(
            "Expected acknowledge, got {other:?}"
        ))),
    }
}
