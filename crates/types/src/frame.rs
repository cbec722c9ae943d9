//! Transport level frame headers and connection messages.
//!
//! A frame is laid out as
//! `[message header][algorithm header][sequence header][body]`. Hello,
//! acknowledge and error frames carry their message directly after an
//! eight byte header; secure frames use a twelve byte header that adds the
//! secure channel id.

use crate::encoding::{BinaryDecodable, BinaryEncodable, ByteString, ensure_remaining};
use crate::error::{DecodeError, Result};
use crate::status_code::StatusCode;
use bytes::{Buf, BufMut};

/// Length of [`MessageHeader`] on the wire.
pub const MESSAGE_HEADER_LEN: usize = 8;

/// Length of [`SecureHeader`] on the wire.
pub const SECURE_HEADER_LEN: usize = 12;

/// Kind of frame, the first three bytes of every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// `HEL`
    Hello,
    /// `ACK`
    Acknowledge,
    /// `ERR`
    Error,
    /// `RHE`, reverse hello.
    ReverseHello,
    /// `OPN`, open secure channel.
    Open,
    /// `CLO`, close secure channel.
    Close,
    /// `MSG`, service message.
    Message,
}

impl MessageType {
    /// ASCII tag.
    #[must_use]
    pub const fn tag(self) -> &'static [u8; 3] {
        match self {
            Self::Hello => b"HEL",
            Self::Acknowledge => b"ACK",
            Self::Error => b"ERR",
            Self::ReverseHello => b"RHE",
            Self::Open => b"OPN",
            Self::Close => b"CLO",
            Self::Message => b"MSG",
        }
    }

    /// Parse an ASCII tag.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidMessageType`] for an unknown tag.
    pub fn from_tag(tag: [u8; 3]) -> Result<Self> {
        match &tag {
            b"HEL" => Ok(Self::Hello),
            b"ACK" => Ok(Self::Acknowledge),
            b"ERR" => Ok(Self::Error),
            b"RHE" => Ok(Self::ReverseHello),
            b"OPN" => Ok(Self::Open),
            b"CLO" => Ok(Self::Close),
            b"MSG" => Ok(Self::Message),
            _ => Err(DecodeError::InvalidMessageType(tag)),
        }
    }

    /// Frames of this type carry a secure channel id.
    #[must_use]
    pub const fn is_secure(self) -> bool {
        matches!(self, Self::Open | Self::Close | Self::Message)
    }

    /// Length of the header for this frame type.
    #[must_use]
    pub const fn header_len(self) -> usize {
        if self.is_secure() {
            SECURE_HEADER_LEN
        } else {
            MESSAGE_HEADER_LEN
        }
    }
}

/// Chunk marker, the fourth byte of every header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChunkType {
    /// `F`, the final (or only) chunk.
    #[default]
    Final,
    /// `C`, an intermediate chunk.
    Intermediate,
    /// `A`, the sender aborted the message.
    Abort,
}

impl ChunkType {
    const fn byte(self) -> u8 {
        match self {
            Self::Final => b'F',
            Self::Intermediate => b'C',
            Self::Abort => b'A',
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            b'F' => Ok(Self::Final),
            b'C' => Ok(Self::Intermediate),
            b'A' => Ok(Self::Abort),
            other => Err(DecodeError::InvalidChunkType(other)),
        }
    }
}

/// Header shared by every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Frame kind.
    pub message_type: MessageType,
    /// Chunk marker.
    pub chunk_type: ChunkType,
    /// Size of the whole frame including this header.
    pub message_size: u32,
}

impl MessageHeader {
    /// Header for a single-chunk frame.
    #[must_use]
    pub const fn new(message_type: MessageType, message_size: u32) -> Self {
        Self {
            message_type,
            chunk_type: ChunkType::Final,
            message_size,
        }
    }
}

impl BinaryEncodable for MessageHeader {
    fn byte_len(&self) -> usize {
        MESSAGE_HEADER_LEN
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self.message_type.tag());
        buf.put_u8(self.chunk_type.byte());
        buf.put_u32_le(self.message_size);
    }
}

impl BinaryDecodable for MessageHeader {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        ensure_remaining(buf, MESSAGE_HEADER_LEN)?;
        let mut tag = [0u8; 3];
        buf.copy_to_slice(&mut tag);
        let message_type = MessageType::from_tag(tag)?;
        let chunk_type = ChunkType::from_byte(buf.get_u8())?;
        Ok(Self {
            message_type,
            chunk_type,
            message_size: buf.get_u32_le(),
        })
    }
}

/// Header of `OPN`, `CLO` and `MSG` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecureHeader {
    /// Common header.
    pub header: MessageHeader,
    /// Secure channel the frame belongs to, zero before it is opened.
    pub secure_channel_id: u32,
}

impl SecureHeader {
    /// Header for a single-chunk secure frame whose body (everything after
    /// this header) is `body_len` bytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn for_body(message_type: MessageType, secure_channel_id: u32, body_len: usize) -> Self {
        Self {
            header: MessageHeader::new(message_type, (SECURE_HEADER_LEN + body_len) as u32),
            secure_channel_id,
        }
    }
}

impl BinaryEncodable for SecureHeader {
    fn byte_len(&self) -> usize {
        SECURE_HEADER_LEN
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        self.header.encode(buf);
        buf.put_u32_le(self.secure_channel_id);
    }
}

binary_struct! {
    /// First message of a connection, sent by the client.
    pub struct Hello {
        /// Protocol version the client speaks.
        pub protocol_version: u32,
        /// Largest chunk the client can receive.
        pub receive_buffer_size: u32,
        /// Largest chunk the client will send.
        pub send_buffer_size: u32,
        /// Largest message the client can receive, zero for no limit.
        pub max_message_size: u32,
        /// Most chunks per message, zero for no limit.
        pub max_chunk_count: u32,
        /// Endpoint the client wants to reach.
        pub endpoint_url: String,
    }
}

binary_struct! {
    /// Server reply to [`Hello`] carrying the revised limits.
    pub struct Acknowledge {
        /// Protocol version the server speaks.
        pub protocol_version: u32,
        /// Largest chunk the server can receive.
        pub receive_buffer_size: u32,
        /// Largest chunk the server will send.
        pub send_buffer_size: u32,
        /// Largest message the server can receive.
        pub max_message_size: u32,
        /// Most chunks per message.
        pub max_chunk_count: u32,
    }
}

binary_struct! {
    /// Body of an `ERR` frame.
    pub struct ErrorMessage {
        /// Why the connection failed.
        pub error: StatusCode,
        /// Free-form reason.
        pub reason: String,
    }
}

binary_struct! {
    /// Security header of `OPN` frames.
    pub struct AsymmetricAlgorithmHeader {
        /// Security policy URI.
        pub security_policy_uri: String,
        /// Sender certificate, null for policy None.
        pub sender_certificate: ByteString,
        /// Thumbprint of the receiver certificate, null for policy None.
        pub receiver_certificate_thumbprint: ByteString,
    }
}

binary_struct! {
    /// Security header of `CLO` and `MSG` frames.
    pub struct SymmetricAlgorithmHeader {
        /// Id of the security token in use.
        pub token_id: u32,
    }
}

binary_struct! {
    /// Sequence header present in every secure frame.
    pub struct SequenceHeader {
        /// Monotonic per-channel frame counter.
        pub sequence_number: u32,
        /// Identifies the message the chunk belongs to.
        pub request_id: u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_header_layout() {
        let header = MessageHeader::new(MessageType::Hello, 60);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..], b"HELF\x3c\x00\x00\x00");
        assert_eq!(MessageHeader::decode(&mut &bytes[..]).unwrap(), header);
    }

    #[test]
    fn secure_header_size_covers_whole_frame() {
        let header = SecureHeader::for_body(MessageType::Message, 9, 20);
        assert_eq!(header.header.message_size, 32);
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), SECURE_HEADER_LEN);
        assert_eq!(&bytes[8..], &[9, 0, 0, 0]);
    }

    #[test]
    fn rejects_unknown_tags() {
        let mut raw: &[u8] = b"XYZF\x08\x00\x00\x00";
        assert_eq!(
            MessageHeader::decode(&mut raw),
            Err(DecodeError::InvalidMessageType(*b"XYZ"))
        );

        let mut raw: &[u8] = b"MSGQ\x08\x00\x00\x00";
        assert_eq!(
            MessageHeader::decode(&mut raw),
            Err(DecodeError::InvalidChunkType(b'Q'))
        );
    }

    #[test]
    fn hello_encodes_url_last() {
        let hello = Hello {
            protocol_version: 0,
            receive_buffer_size: 65536,
            send_buffer_size: 65536,
            max_message_size: 65536,
            max_chunk_count: 256,
            endpoint_url: "opc.tcp://localhost:4840".into(),
        };
        let bytes = hello.to_bytes();
        assert_eq!(bytes.len(), 20 + 4 + 24);
        assert_eq!(&bytes[24..], b"opc.tcp://localhost:4840");
    }
}
