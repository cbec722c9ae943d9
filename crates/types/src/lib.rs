//! Binary encoding layer for OPC UA over TCP.
//!
//! This crate provides the wire representation used by the client engine:
//! little-endian primitives, node ids, status codes, variants, the frame
//! sub-headers and the service request/response catalogue.
//!
//! Every wire type implements [`BinaryEncodable`] and [`BinaryDecodable`].
//! [`BinaryEncodable::byte_len`] gives the exact encoded size, which is what
//! frame headers need before the body is written.
//!
//! # Example
//!
//! ```
//! use ua_types::{BinaryDecodable, BinaryEncodable, NodeId};
//!
//! let id: NodeId = "ns=2;s=Line1.Speed".parse().unwrap();
//! let bytes = id.to_bytes();
//! assert_eq!(bytes.len(), id.byte_len());
//! assert_eq!(NodeId::decode(&mut &bytes[..]).unwrap(), id);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod macros;

pub mod encoding;
pub mod error;
pub mod frame;
pub mod header;
pub mod node_id;
pub mod service;
pub mod status_code;
pub mod variant;

pub use encoding::{BinaryDecodable, BinaryEncodable, ByteString, DateTime};
pub use error::{DecodeError, ParseNodeIdError, Result};
pub use header::{RequestHeader, ResponseHeader};
pub use node_id::{ExpandedNodeId, Identifier, NodeId};
pub use service::{ServiceRequest, ServiceResponse};
pub use status_code::StatusCode;
pub use variant::{
    DataValue, DiagnosticInfo, ExtensionBody, ExtensionObject, LocalizedText, QualifiedName,
    Variant,
};

// Re-export dependencies that are part of our public API
pub use uuid::Uuid;
