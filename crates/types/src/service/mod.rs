//! Service request and response catalogue.
//!
//! Every request starts with a [`RequestHeader`] and every response with a
//! [`ResponseHeader`]. On the wire a message body is the binary encoding id
//! of the type followed by its fields.

pub mod attribute;
pub mod discovery;
pub mod fault;
pub mod method;
pub mod node_management;
pub mod secure_channel;
pub mod session;
pub mod subscription;
pub mod view;

use crate::encoding::{BinaryDecodable, BinaryEncodable};
use crate::frame::MessageType;
use crate::header::{RequestHeader, ResponseHeader};

/// A service request bound to its response type.
pub trait ServiceRequest: BinaryEncodable + Send + Sync + 'static {
    /// The response the server answers with.
    type Response: ServiceResponse;

    /// Binary encoding id written before the body.
    const TYPE_ID: u32;

    /// Frame type the request travels in.
    const MESSAGE_TYPE: MessageType = MessageType::Message;

    /// The request header.
    fn request_header(&self) -> &RequestHeader;

    /// Mutable access to the request header, used to stamp it before sending.
    fn request_header_mut(&mut self) -> &mut RequestHeader;
}

/// A service response.
pub trait ServiceResponse: BinaryDecodable + Send + 'static {
    /// Binary encoding id written before the body.
    const TYPE_ID: u32;

    /// The response header.
    fn response_header(&self) -> &ResponseHeader;

    /// A response populated only from its header. Used when the server
    /// answers with a header and no body.
    fn from_response_header(header: ResponseHeader) -> Self;
}
