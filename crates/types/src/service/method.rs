//! Method service.

use crate::header::{RequestHeader, ResponseHeader};
use crate::node_id::NodeId;
use crate::status_code::StatusCode;
use crate::variant::{DiagnosticInfo, Variant};

binary_struct! {
    /// One method invocation.
    pub struct CallMethodRequest {
        /// Object or object type the method belongs to.
        pub object_id: NodeId,
        /// The method.
        pub method_id: NodeId,
        /// Input arguments.
        pub input_arguments: Vec<Variant>,
    }
}

binary_struct! {
    /// Outcome of one method invocation.
    pub struct CallMethodResult {
        /// Overall result.
        pub status_code: StatusCode,
        /// Per input argument results.
        pub input_argument_results: Vec<StatusCode>,
        /// Per input argument diagnostics.
        pub input_argument_diagnostic_infos: Vec<DiagnosticInfo>,
        /// Output arguments.
        pub output_arguments: Vec<Variant>,
    }
}

binary_struct! {
    /// Calls methods.
    pub struct CallRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Methods to call.
        pub methods_to_call: Vec<CallMethodRequest>,
    }
}

binary_struct! {
    /// Reply to [`CallRequest`].
    pub struct CallResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// One result per call.
        pub results: Vec<CallMethodResult>,
        /// Per call diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

service_pair!(CallRequest => CallResponse, request_id = 712, response_id = 715);
