//! Node management services.

use crate::header::{RequestHeader, ResponseHeader};
use crate::node_id::{ExpandedNodeId, NodeId};
use crate::status_code::StatusCode;
use crate::variant::{DiagnosticInfo, ExtensionObject, LocalizedText, QualifiedName, Variant};

/// Binary encoding id of [`ObjectAttributes`].
pub const OBJECT_ATTRIBUTES_ID: u32 = 354;

/// Binary encoding id of [`VariableAttributes`].
pub const VARIABLE_ATTRIBUTES_ID: u32 = 357;

binary_enum! {
    /// Class of a node.
    pub enum NodeClass {
        /// No class, used as a wildcard.
        #[default]
        Unspecified = 0,
        /// Object.
        Object = 1,
        /// Variable.
        Variable = 2,
        /// Method.
        Method = 4,
        /// Object type.
        ObjectType = 8,
        /// Variable type.
        VariableType = 16,
        /// Reference type.
        ReferenceType = 32,
        /// Data type.
        DataType = 64,
        /// View.
        View = 128,
    }
}

binary_struct! {
    /// Attributes of a new object node.
    pub struct ObjectAttributes {
        /// Bit mask of the attributes that are set.
        pub specified_attributes: u32,
        /// Display name.
        pub display_name: LocalizedText,
        /// Description.
        pub description: LocalizedText,
        /// Write mask.
        pub write_mask: u32,
        /// User write mask.
        pub user_write_mask: u32,
        /// Event notifier flags.
        pub event_notifier: u8,
    }
}

binary_struct! {
    /// Attributes of a new variable node.
    pub struct VariableAttributes {
        /// Bit mask of the attributes that are set.
        pub specified_attributes: u32,
        /// Display name.
        pub display_name: LocalizedText,
        /// Description.
        pub description: LocalizedText,
        /// Write mask.
        pub write_mask: u32,
        /// User write mask.
        pub user_write_mask: u32,
        /// Initial value.
        pub value: Variant,
        /// Data type.
        pub data_type: NodeId,
        /// Value rank.
        pub value_rank: i32,
        /// Array dimensions.
        pub array_dimensions: Vec<u32>,
        /// Access level.
        pub access_level: u8,
        /// User access level.
        pub user_access_level: u8,
        /// Minimum sampling interval in milliseconds.
        pub minimum_sampling_interval: f64,
        /// Whether history is collected.
        pub historizing: bool,
    }
}

impl ObjectAttributes {
    /// Wrap for [`AddNodesItem::node_attributes`].
    #[must_use]
    pub fn into_extension_object(self) -> ExtensionObject {
        ExtensionObject::from_message(OBJECT_ATTRIBUTES_ID, &self)
    }
}

impl VariableAttributes {
    /// Wrap for [`AddNodesItem::node_attributes`].
    #[must_use]
    pub fn into_extension_object(self) -> ExtensionObject {
        ExtensionObject::from_message(VARIABLE_ATTRIBUTES_ID, &self)
    }
}

binary_struct! {
    /// A node to add.
    pub struct AddNodesItem {
        /// Parent node.
        pub parent_node_id: ExpandedNodeId,
        /// Reference from the parent to the new node.
        pub reference_type_id: NodeId,
        /// Requested id, null to let the server choose.
        pub requested_new_node_id: ExpandedNodeId,
        /// Browse name.
        pub browse_name: QualifiedName,
        /// Class of the new node.
        pub node_class: NodeClass,
        /// Class specific attributes.
        pub node_attributes: ExtensionObject,
        /// Type definition.
        pub type_definition: ExpandedNodeId,
    }
}

binary_struct! {
    /// Outcome of adding one node.
    pub struct AddNodesResult {
        /// Result.
        pub status_code: StatusCode,
        /// Id of the added node.
        pub added_node_id: NodeId,
    }
}

binary_struct! {
    /// Adds nodes.
    pub struct AddNodesRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Nodes to add.
        pub nodes_to_add: Vec<AddNodesItem>,
    }
}

binary_struct! {
    /// Reply to [`AddNodesRequest`].
    pub struct AddNodesResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One result per node.
        pub results: Vec<AddNodesResult>,
        /// Per node diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// A reference to add.
    pub struct AddReferencesItem {
        /// Source node.
        pub source_node_id: NodeId,
        /// Reference type.
        pub reference_type_id: NodeId,
        /// Direction.
        pub is_forward: bool,
        /// URI of the target server, empty for local.
        pub target_server_uri: String,
        /// Target node.
        pub target_node_id: ExpandedNodeId,
        /// Class of the target.
        pub target_node_class: NodeClass,
    }
}

binary_struct! {
    /// Adds references.
    pub struct AddReferencesRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// References to add.
        pub references_to_add: Vec<AddReferencesItem>,
    }
}

binary_struct! {
    /// Reply to [`AddReferencesRequest`].
    pub struct AddReferencesResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One status per reference.
        pub results: Vec<StatusCode>,
        /// Per reference diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// A node to delete.
    pub struct DeleteNodesItem {
        /// The node.
        pub node_id: NodeId,
        /// Also delete references pointing at the node.
        pub delete_target_references: bool,
    }
}

binary_struct! {
    /// Deletes nodes.
    pub struct DeleteNodesRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Nodes to delete.
        pub nodes_to_delete: Vec<DeleteNodesItem>,
    }
}

binary_struct! {
    /// Reply to [`DeleteNodesRequest`].
    pub struct DeleteNodesResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One status per node.
        pub results: Vec<StatusCode>,
        /// Per node diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// A reference to delete.
    pub struct DeleteReferencesItem {
        /// Source node.
        pub source_node_id: NodeId,
        /// Reference type.
        pub reference_type_id: NodeId,
        /// Direction.
        pub is_forward: bool,
        /// Target node.
        pub target_node_id: ExpandedNodeId,
        /// Also delete the reverse reference.
        pub delete_bidirectional: bool,
    }
}

binary_struct! {
    /// Deletes references.
    pub struct DeleteReferencesRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// References to delete.
        pub references_to_delete: Vec<DeleteReferencesItem>,
    }
}

binary_struct! {
    /// Reply to [`DeleteReferencesRequest`].
    pub struct DeleteReferencesResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One status per reference.
        pub results: Vec<StatusCode>,
        /// Per reference diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

service_pair!(AddNodesRequest => AddNodesResponse, request_id = 488, response_id = 491);
service_pair!(AddReferencesRequest => AddReferencesResponse, request_id = 494, response_id = 497);
service_pair!(DeleteNodesRequest => DeleteNodesResponse, request_id = 500, response_id = 503);
service_pair!(DeleteReferencesRequest => DeleteReferencesResponse, request_id = 506, response_id = 509);
