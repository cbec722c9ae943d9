//! View services: browsing, path translation and node registration.

use crate::encoding::{ByteString, DateTime};
use crate::header::{RequestHeader, ResponseHeader};
use crate::node_id::{ExpandedNodeId, NodeId};
use crate::service::node_management::NodeClass;
use crate::status_code::StatusCode;
use crate::variant::{DiagnosticInfo, LocalizedText, QualifiedName};

/// `BrowseResultMask` with every field set.
pub const BROWSE_RESULT_MASK_ALL: u32 = 0x3F;

binary_enum! {
    /// Direction of references to follow.
    pub enum BrowseDirection {
        /// Forward references.
        #[default]
        Forward = 0,
        /// Inverse references.
        Inverse = 1,
        /// Both directions.
        Both = 2,
    }
}

binary_struct! {
    /// View to browse, null for the whole address space.
    pub struct ViewDescription {
        /// View node.
        pub view_id: NodeId,
        /// Version time.
        pub timestamp: DateTime,
        /// Version number.
        pub view_version: u32,
    }
}

binary_struct! {
    /// A node to browse.
    pub struct BrowseDescription {
        /// Starting node.
        pub node_id: NodeId,
        /// Direction.
        pub browse_direction: BrowseDirection,
        /// Reference type to follow, null for all.
        pub reference_type_id: NodeId,
        /// Also follow subtypes of the reference type.
        pub include_subtypes: bool,
        /// Node classes to return, zero for all.
        pub node_class_mask: u32,
        /// Fields to return for each reference.
        pub result_mask: u32,
    }
}

impl BrowseDescription {
    /// Forward hierarchical references of `node_id` with every field.
    #[must_use]
    pub const fn children_of(node_id: NodeId) -> Self {
        Self {
            node_id,
            browse_direction: BrowseDirection::Forward,
            reference_type_id: NodeId::HIERARCHICAL_REFERENCES,
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: BROWSE_RESULT_MASK_ALL,
        }
    }
}

binary_struct! {
    /// A reference returned by browse.
    pub struct ReferenceDescription {
        /// Reference type.
        pub reference_type_id: NodeId,
        /// Direction.
        pub is_forward: bool,
        /// Target node.
        pub node_id: ExpandedNodeId,
        /// Target browse name.
        pub browse_name: QualifiedName,
        /// Target display name.
        pub display_name: LocalizedText,
        /// Target class.
        pub node_class: NodeClass,
        /// Target type definition.
        pub type_definition: ExpandedNodeId,
    }
}

binary_struct! {
    /// References of one browsed node.
    pub struct BrowseResult {
        /// Result.
        pub status_code: StatusCode,
        /// Set when more references remain.
        pub continuation_point: ByteString,
        /// References found.
        pub references: Vec<ReferenceDescription>,
    }
}

binary_struct! {
    /// Browses references of nodes.
    pub struct BrowseRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// View to browse.
        pub view: ViewDescription,
        /// Limit per node, zero for no limit.
        pub requested_max_references_per_node: u32,
        /// Nodes to browse.
        pub nodes_to_browse: Vec<BrowseDescription>,
    }
}

binary_struct! {
    /// Reply to [`BrowseRequest`].
    pub struct BrowseResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One result per node.
        pub results: Vec<BrowseResult>,
        /// Per node diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// Continues or releases browse continuation points.
    pub struct BrowseNextRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Release instead of continuing.
        pub release_continuation_points: bool,
        /// Continuation points to use.
        pub continuation_points: Vec<ByteString>,
    }
}

binary_struct! {
    /// Reply to [`BrowseNextRequest`].
    pub struct BrowseNextResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One result per continuation point.
        pub results: Vec<BrowseResult>,
        /// Per point diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// One hop of a relative path.
    pub struct RelativePathElement {
        /// Reference type to follow.
        pub reference_type_id: NodeId,
        /// Follow inverse references.
        pub is_inverse: bool,
        /// Also follow subtypes.
        pub include_subtypes: bool,
        /// Browse name of the target.
        pub target_name: QualifiedName,
    }
}

binary_struct! {
    /// Sequence of hops.
    pub struct RelativePath {
        /// The hops.
        pub elements: Vec<RelativePathElement>,
    }
}

binary_struct! {
    /// A starting node and a path from it.
    pub struct BrowsePath {
        /// Starting node.
        pub starting_node: NodeId,
        /// Path to follow.
        pub relative_path: RelativePath,
    }
}

binary_struct! {
    /// A node reached by a browse path.
    pub struct BrowsePathTarget {
        /// The node.
        pub target_id: ExpandedNodeId,
        /// Index of the first unprocessed element, `u32::MAX` when complete.
        pub remaining_path_index: u32,
    }
}

binary_struct! {
    /// Targets of one browse path.
    pub struct BrowsePathResult {
        /// Result.
        pub status_code: StatusCode,
        /// Nodes reached.
        pub targets: Vec<BrowsePathTarget>,
    }
}

binary_struct! {
    /// Resolves browse paths to node ids.
    pub struct TranslateBrowsePathsToNodeIdsRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Paths to resolve.
        pub browse_paths: Vec<BrowsePath>,
    }
}

binary_struct! {
    /// Reply to [`TranslateBrowsePathsToNodeIdsRequest`].
    pub struct TranslateBrowsePathsToNodeIdsResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One result per path.
        pub results: Vec<BrowsePathResult>,
        /// Per path diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// Registers nodes for repeated access.
    pub struct RegisterNodesRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Nodes to register.
        pub nodes_to_register: Vec<NodeId>,
    }
}

binary_struct! {
    /// Reply to [`RegisterNodesRequest`].
    pub struct RegisterNodesResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// Aliases to use instead of the requested ids.
        pub registered_node_ids: Vec<NodeId>,
    }
}

binary_struct! {
    /// Releases registered nodes.
    pub struct UnregisterNodesRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Nodes to unregister.
        pub nodes_to_unregister: Vec<NodeId>,
    }
}

binary_struct! {
    /// Reply to [`UnregisterNodesRequest`].
    pub struct UnregisterNodesResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
    }
}

service_pair!(BrowseRequest => BrowseResponse, request_id = 527, response_id = 530);
service_pair!(BrowseNextRequest => BrowseNextResponse, request_id = 533, response_id = 536);
service_pair!(
    TranslateBrowsePathsToNodeIdsRequest => TranslateBrowsePathsToNodeIdsResponse,
    request_id = 554,
    response_id = 557,
);
service_pair!(RegisterNodesRequest => RegisterNodesResponse, request_id = 560, response_id = 563);
service_pair!(UnregisterNodesRequest => UnregisterNodesResponse, request_id = 566, response_id = 569);
