//! Interpretation of received frames.
//!
//! A secure frame is `[header][channel id][algorithm header][sequence
//! header][body]`. The body starts with the encoding id of the message and
//! a response header, which carries the request handle used to find the
//! waiting caller.

use crate::error::{Error, Result};
use crate::framing::Frame;
use bytes::{Buf, Bytes};
use ua_types::frame::{
    AsymmetricAlgorithmHeader, ChunkType, ErrorMessage, MESSAGE_HEADER_LEN, MessageType,
    SequenceHeader, SymmetricAlgorithmHeader,
};
use ua_types::service::fault::SERVICE_FAULT_ID;
use ua_types::{BinaryDecodable, NodeId, ResponseHeader, ServiceResponse};

/// A decoded secure frame.
#[derive(Debug)]
pub(crate) struct Incoming {
    pub message_type: MessageType,
    pub secure_channel_id: u32,
    pub sequence: SequenceHeader,
    pub delivery: Delivery,
}

/// What a pending slot receives: the body of a response with its header
/// already decoded.
#[derive(Debug, Clone)]
pub(crate) struct Delivery {
    pub type_id: u32,
    pub header: ResponseHeader,
    /// Body from the start of the response header.
    body: Bytes,
    header_len: usize,
}

impl Delivery {
    /// `true` if the body is a service fault.
    pub const fn is_service_fault(&self) -> bool {
        self.type_id == SERVICE_FAULT_ID
    }

    /// Decode the body as `R`.
    ///
    /// A service fault becomes [`Error::ServiceFault`]. A body holding only
    /// the response header yields a response built from that header.
    pub fn into_response<R: ServiceResponse>(self) -> Result<R> {
        if self.is_service_fault() {
            return Err(Error::ServiceFault {
                status: self.header.service_result,
            });
        }

        if self.type_id != R::TYPE_ID {
            return Err(Error::UnexpectedResponse {
                expected: R::TYPE_ID,
                actual: self.type_id,
            });
        }

        if self.body.len() == self.header_len {
            return Ok(R::from_response_header(self.header));
        }

        let mut body = self.body;
        Ok(R::decode(&mut body)?)
    }
}

fn read_header<T: BinaryDecodable>(buf: &mut Bytes, what: &str) -> Result<T> {
    T::decode(buf).map_err(|e| Error::MalformedFrame(format!("Truncated {what}: {e}")))
}

/// Decode a frame read by the receive loop.
///
/// # Errors
///
/// - [`Error::ProtocolFault`] for an `ERR` frame.
/// - [`Error::UnsupportedChunk`] for anything but a final chunk.
/// - [`Error::MalformedFrame`] if the headers do not fit the declared size
///   or the frame type is not expected on an open connection.
/// - [`Error::Decode`] if the body cannot be decoded.
pub(crate) fn interpret(frame: Frame) -> Result<Incoming> {
    let message_type = frame.message_type();
    let declared = frame.header.message_size as usize;
    let mut buf = frame.payload;
    let payload_len = buf.len();

    match message_type {
        MessageType::Error => {
            let error: ErrorMessage = read_header(&mut buf, "error message")?;
            return Err(Error::ProtocolFault {
                status: error.error,
                reason: error.reason,
            });
        }
        MessageType::Hello | MessageType::Acknowledge | MessageType::ReverseHello => {
            return Err(Error::MalformedFrame(format!(
                "Unexpected {message_type:?} frame on an open connection"
            )));
        }
        MessageType::Open | MessageType::Close | MessageType::Message => {}
    }

    // Reassembly of intermediate chunks would start here.
    if frame.header.chunk_type != ChunkType::Final {
        return Err(Error::UnsupportedChunk(frame.header.chunk_type));
    }

    let secure_channel_id: u32 = read_header(&mut buf, "secure channel id")?;
    if message_type == MessageType::Open {
        let _: AsymmetricAlgorithmHeader = read_header(&mut buf, "asymmetric algorithm header")?;
    } else {
        let _: SymmetricAlgorithmHeader = read_header(&mut buf, "symmetric algorithm header")?;
    }
    let sequence: SequenceHeader = read_header(&mut buf, "sequence header")?;

    let consumed = MESSAGE_HEADER_LEN + payload_len - buf.remaining();
    if declared <= consumed {
        return Err(Error::MalformedFrame(format!(
            "Declared size {declared} leaves no body after {consumed} header bytes"
        )));
    }

    let type_id = NodeId::decode(&mut buf)?;
    let Some(type_id) = type_id.as_numeric().filter(|_| type_id.namespace == 0) else {
        return Err(Error::MalformedFrame(format!(
            "Unexpected body encoding id {type_id}"
        )));
    };

    let body = buf.clone();
    let header = ResponseHeader::decode(&mut buf)?;
    let header_len = body.len() - buf.remaining();

    Ok(Incoming {
        message_type,
        secure_channel_id,
        sequence,
        delivery: Delivery {
            type_id,
            header,
            body,
            header_len,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use ua_types::StatusCode;
    use ua_types::frame::MessageHeader;
    use ua_types::service::attribute::ReadResponse;
    use ua_types::service::fault::ServiceFault;
    use ua_types::service::view::BrowseResponse;
    use ua_types::{BinaryEncodable, DataValue};

    fn message_frame<M: BinaryEncodable>(type_id: u32, message: &M) -> Frame {
        Frame::secure(
            MessageType::Message,
            5,
            &SymmetricAlgorithmHeader { token_id: 1 },
            &SequenceHeader {
                sequence_number: 10,
                request_id: 3,
            },
            type_id,
            message,
        )
    }

    #[test]
    fn test_interprets_message_frame() {
        let response = ReadResponse {
            response_header: ResponseHeader::good(7),
            results: vec![DataValue::new(42i32)],
            ..Default::default()
        };

        let incoming = interpret(message_frame(ReadResponse::TYPE_ID, &response)).unwrap();
        assert_eq!(incoming.secure_channel_id, 5);
        assert_eq!(incoming.sequence.sequence_number, 10);
        assert_eq!(incoming.delivery.header.request_handle, 7);

        let decoded: ReadResponse = incoming.delivery.into_response().unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_header_only_body() {
        let header = ResponseHeader::with_result(9, StatusCode::BAD_NODE_ID_UNKNOWN);
        let incoming = interpret(message_frame(ReadResponse::TYPE_ID, &header)).unwrap();

        let decoded: ReadResponse = incoming.delivery.into_response().unwrap();
        assert_eq!(decoded.response_header, header);
        assert!(decoded.results.is_empty());
    }

    #[test]
    fn test_service_fault_and_type_mismatch() {
        let fault = ServiceFault {
            response_header: ResponseHeader::with_result(2, StatusCode::BAD_TIMEOUT),
        };
        let incoming = interpret(message_frame(SERVICE_FAULT_ID, &fault)).unwrap();
        assert!(incoming.delivery.is_service_fault());
        assert!(matches!(
            incoming.delivery.into_response::<ReadResponse>(),
            Err(Error::ServiceFault { status }) if status == StatusCode::BAD_TIMEOUT
        ));

        let read = ReadResponse {
            response_header: ResponseHeader::good(1),
            ..Default::default()
        };
        let incoming = interpret(message_frame(ReadResponse::TYPE_ID, &read)).unwrap();
        assert!(matches!(
            incoming.delivery.into_response::<BrowseResponse>(),
            Err(Error::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_header_only_frame_is_malformed() {
        let mut payload = BytesMut::new();
        payload.put_u32_le(5);
        SymmetricAlgorithmHeader { token_id: 1 }.encode(&mut payload);
        SequenceHeader {
            sequence_number: 1,
            request_id: 1,
        }
        .encode(&mut payload);
        let frame = Frame::new(MessageType::Message, payload.freeze());
        assert_eq!(frame.header.message_size, 24);

        assert!(matches!(interpret(frame), Err(Error::MalformedFrame(_))));
    }

    #[test]
    fn test_error_frame_and_chunks() {
        let error = ErrorMessage {
            error: StatusCode::BAD_TCP_MESSAGE_TOO_LARGE,
            reason: "too big".into(),
        };
        let frame = Frame::message(MessageType::Error, &error);
        assert!(matches!(
            interpret(frame),
            Err(Error::ProtocolFault { status, reason })
                if status == StatusCode::BAD_TCP_MESSAGE_TOO_LARGE && reason == "too big"
        ));

        let mut frame = message_frame(ReadResponse::TYPE_ID, &ResponseHeader::good(1));
        frame.header = MessageHeader {
            chunk_type: ChunkType::Intermediate,
            ..frame.header
        };
        assert!(matches!(
            interpret(frame),
            Err(Error::UnsupportedChunk(ChunkType::Intermediate))
        ));
    }
}
