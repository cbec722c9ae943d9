//! Attribute services.

use crate::header::{RequestHeader, ResponseHeader};
use crate::node_id::NodeId;
use crate::status_code::StatusCode;
use crate::variant::{DataValue, DiagnosticInfo, QualifiedName};

/// Well-known attribute ids.
pub mod attribute_id {
    /// `NodeId`
    pub const NODE_ID: u32 = 1;
    /// `NodeClass`
    pub const NODE_CLASS: u32 = 2;
    /// `BrowseName`
    pub const BROWSE_NAME: u32 = 3;
    /// `DisplayName`
    pub const DISPLAY_NAME: u32 = 4;
    /// `Description`
    pub const DESCRIPTION: u32 = 5;
    /// `WriteMask`
    pub const WRITE_MASK: u32 = 6;
    /// `UserWriteMask`
    pub const USER_WRITE_MASK: u32 = 7;
    /// `EventNotifier`
    pub const EVENT_NOTIFIER: u32 = 12;
    /// `Value`
    pub const VALUE: u32 = 13;
    /// `DataType`
    pub const DATA_TYPE: u32 = 14;
    /// `ValueRank`
    pub const VALUE_RANK: u32 = 15;
    /// `AccessLevel`
    pub const ACCESS_LEVEL: u32 = 17;
    /// `UserAccessLevel`
    pub const USER_ACCESS_LEVEL: u32 = 18;
}

binary_enum! {
    /// Timestamps the server should include in returned values.
    pub enum TimestampsToReturn {
        /// Source timestamp only.
        Source = 0,
        /// Server timestamp only.
        Server = 1,
        /// Both timestamps.
        #[default]
        Both = 2,
        /// No timestamps.
        Neither = 3,
    }
}

binary_struct! {
    /// Identifies an attribute to read or monitor.
    pub struct ReadValueId {
        /// Node to read.
        pub node_id: NodeId,
        /// Attribute to read.
        pub attribute_id: u32,
        /// Array index range, empty for the whole value.
        pub index_range: String,
        /// Requested data encoding, null for the default.
        pub data_encoding: QualifiedName,
    }
}

impl ReadValueId {
    /// Read the `Value` attribute of `node_id`.
    #[must_use]
    pub fn value_of(node_id: NodeId) -> Self {
        Self {
            node_id,
            attribute_id: attribute_id::VALUE,
            ..Self::default()
        }
    }
}

binary_struct! {
    /// Reads attributes.
    pub struct ReadRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Maximum cached age in milliseconds.
        pub max_age: f64,
        /// Timestamps to return.
        pub timestamps_to_return: TimestampsToReturn,
        /// Attributes to read.
        pub nodes_to_read: Vec<ReadValueId>,
    }
}

binary_struct! {
    /// Reply to [`ReadRequest`].
    pub struct ReadResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One value per requested attribute.
        pub results: Vec<DataValue>,
        /// Per attribute diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// A value to write to an attribute.
    pub struct WriteValue {
        /// Target node.
        pub node_id: NodeId,
        /// Target attribute.
        pub attribute_id: u32,
        /// Array index range, empty for the whole value.
        pub index_range: String,
        /// Value to write.
        pub value: DataValue,
    }
}

binary_struct! {
    /// Writes attributes.
    pub struct WriteRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Values to write.
        pub nodes_to_write: Vec<WriteValue>,
    }
}

binary_struct! {
    /// Reply to [`WriteRequest`].
    pub struct WriteResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One status per write.
        pub results: Vec<StatusCode>,
        /// Per write diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

service_pair!(ReadRequest => ReadResponse, request_id = 631, response_id = 634);
service_pair!(WriteRequest => WriteResponse, request_id = 673, response_id = 676);
