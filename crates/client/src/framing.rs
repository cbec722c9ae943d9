//! Frame codec for the wire protocol.
//!
//! Every frame starts with an eight byte [`MessageHeader`] whose size field
//! covers the whole frame. [`FrameCodec`] splits a byte stream into frames
//! on that field; [`FrameReader`] runs it over a [`Transport`].

use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::sync::Arc;
use tokio_util::codec::{Decoder, Encoder};
use ua_transport::{Transport, TransportError};
use ua_types::frame::{
    MESSAGE_HEADER_LEN, MessageHeader, MessageType, SECURE_HEADER_LEN, SequenceHeader,
};
use ua_types::{BinaryDecodable, BinaryEncodable, NodeId};

/// Bytes requested from the transport per read.
const READ_CHUNK_SIZE: usize = 8192;

/// One complete frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame header.
    pub header: MessageHeader,
    /// Everything after the eight byte header.
    pub payload: Bytes,
}

impl Frame {
    /// A single-chunk frame around `payload`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(message_type: MessageType, payload: Bytes) -> Self {
        Self {
            header: MessageHeader::new(message_type, (MESSAGE_HEADER_LEN + payload.len()) as u32),
            payload,
        }
    }

    /// A hello, acknowledge or error frame carrying `message`.
    #[must_use]
    pub fn message<T: BinaryEncodable>(message_type: MessageType, message: &T) -> Self {
        Self::new(message_type, message.to_bytes())
    }

    /// An `OPN`, `CLO` or `MSG` frame.
    ///
    /// `security_header` is the asymmetric header for `OPN` and the
    /// symmetric header otherwise. The body is the encoding id of `message`
    /// followed by the message itself.
    #[must_use]
    pub fn secure<H, M>(
        message_type: MessageType,
        secure_channel_id: u32,
        security_header: &H,
        sequence: &SequenceHeader,
        type_id: u32,
        message: &M,
    ) -> Self
    where
        H: BinaryEncodable,
        M: BinaryEncodable,
    {
        let type_id = NodeId::numeric(0, type_id);
        let len = SECURE_HEADER_LEN - MESSAGE_HEADER_LEN
            + security_header.byte_len()
            + sequence.byte_len()
            + type_id.byte_len()
            + message.byte_len();

        let mut payload = BytesMut::with_capacity(len);
        payload.put_u32_le(secure_channel_id);
        security_header.encode(&mut payload);
        sequence.encode(&mut payload);
        type_id.encode(&mut payload);
        message.encode(&mut payload);

        Self::new(message_type, payload.freeze())
    }

    /// Message type of the frame.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.header.message_type
    }

    /// Size of the frame on the wire.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        MESSAGE_HEADER_LEN + self.payload.len()
    }

    /// The frame as wire bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.header.encode(&mut buf);
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

/// Codec for encoding/decoding frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    /// Codec that rejects frames larger than `max_frame_size`.
    #[must_use]
    pub const fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Largest frame the codec accepts.
    #[must_use]
    pub const fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>> {
        if buf.len() < MESSAGE_HEADER_LEN {
            return Ok(None);
        }

        // Parse header without consuming
        let header = MessageHeader::decode(&mut &buf[..MESSAGE_HEADER_LEN])
            .map_err(|e| Error::MalformedFrame(e.to_string()))?;
        let frame_len = header.message_size as usize;

        if frame_len < MESSAGE_HEADER_LEN {
            return Err(Error::MalformedFrame(format!(
                "Declared size {frame_len} is smaller than the frame header"
            )));
        }

        if frame_len > self.max_frame_size {
            return Err(Error::MalformedFrame(format!(
                "Frame size {frame_len} exceeds maximum {}",
                self.max_frame_size
            )));
        }

        if buf.len() < frame_len {
            buf.reserve(frame_len - buf.len());
            return Ok(None);
        }

        let mut frame = buf.split_to(frame_len);
        let payload = frame.split_off(MESSAGE_HEADER_LEN).freeze();

        Ok(Some(Frame { header, payload }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, buf: &mut BytesMut) -> Result<()> {
        buf.reserve(frame.wire_len());
        frame.header.encode(buf);
        buf.put(frame.payload);
        Ok(())
    }
}

/// Reads whole frames from a transport.
pub struct FrameReader {
    transport: Arc<dyn Transport>,
    codec: FrameCodec,
    buffer: BytesMut,
    chunk: Vec<u8>,
}

impl FrameReader {
    /// Reader over `transport` accepting frames up to `max_frame_size`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, max_frame_size: usize) -> Self {
        Self {
            transport,
            codec: FrameCodec::new(max_frame_size),
            buffer: BytesMut::new(),
            chunk: vec![0; READ_CHUNK_SIZE],
        }
    }

    /// Read the next frame.
    ///
    /// Returns `None` when the peer closed the stream between frames.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the read fails or the stream closes
    /// inside a frame, and [`Error::MalformedFrame`] for an invalid header.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.codec.decode(&mut self.buffer)? {
                return Ok(Some(frame));
            }

            let read = self.transport.receive(&mut self.chunk).await?;
            if read == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(TransportError::ConnectionClosed.into());
            }
            self.buffer.extend_from_slice(&self.chunk[..read]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ua_types::frame::{Hello, SymmetricAlgorithmHeader};

    #[test]
    fn test_frame_codec_splits_stream() {
        let mut codec = FrameCodec::new(1024);
        let mut buf = BytesMut::new();

        let first = Frame::message(MessageType::Hello, &Hello::default());
        let second = Frame::secure(
            MessageType::Message,
            4,
            &SymmetricAlgorithmHeader { token_id: 1 },
            &SequenceHeader {
                sequence_number: 1,
                request_id: 1,
            },
            631,
            &7u32,
        );

        codec.encode(first.clone(), &mut buf).unwrap();
        codec.encode(second.clone(), &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(first));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(second));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_frame() {
        let mut codec = FrameCodec::new(1024);
        let bytes = Frame::message(MessageType::Hello, &Hello::default()).to_bytes();

        let mut buf = BytesMut::from(&bytes[..5]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&bytes[5..bytes.len() - 1]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&bytes[bytes.len() - 1..]);
        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_secure_frame_layout() {
        let frame = Frame::secure(
            MessageType::Message,
            9,
            &SymmetricAlgorithmHeader { token_id: 3 },
            &SequenceHeader {
                sequence_number: 51,
                request_id: 2,
            },
            631,
            &0xAABB_CCDDu32,
        );

        let bytes = frame.to_bytes();
        // header, channel, token, sequence, four byte node id, body
        assert_eq!(bytes.len(), 8 + 4 + 4 + 8 + 4 + 4);
        assert_eq!(frame.wire_len(), bytes.len());
        assert_eq!(&bytes[..4], b"MSGF");
        assert_eq!(&bytes[4..8], &32u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &9u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &3u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &51u32.to_le_bytes());
        assert_eq!(&bytes[24..28], &[0x01, 0x00, 0x77, 0x02]);
        assert_eq!(&bytes[28..], &0xAABB_CCDDu32.to_le_bytes());
    }

    #[test]
    fn test_rejects_bad_sizes() {
        let mut codec = FrameCodec::new(64);

        let mut buf = BytesMut::from(&b"MSGF\x04\x00\x00\x00"[..]);
        assert!(matches!(codec.decode(&mut buf), Err(Error::MalformedFrame(_))));

        let mut buf = BytesMut::from(&b"MSGF\x00\x01\x00\x00"[..]);
        assert!(matches!(codec.decode(&mut buf), Err(Error::MalformedFrame(_))));

        let mut buf = BytesMut::from(&b"FOOF\x08\x00\x00\x00"[..]);
        assert!(matches!(codec.decode(&mut buf), Err(Error::MalformedFrame(_))));
    }
}
