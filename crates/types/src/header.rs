//! Request and response headers shared by every service.

use crate::encoding::DateTime;
use crate::node_id::NodeId;
use crate::status_code::StatusCode;
use crate::variant::{DiagnosticInfo, ExtensionObject};

binary_struct! {
    /// Header sent with every service request.
    pub struct RequestHeader {
        /// Session token, null before a session is activated.
        pub authentication_token: NodeId,
        /// Time the request was sent.
        pub timestamp: DateTime,
        /// Correlates the response to this request.
        pub request_handle: u32,
        /// Diagnostics the server should return.
        pub return_diagnostics: u32,
        /// Audit log entry id.
        pub audit_entry_id: String,
        /// Milliseconds the client waits for the response.
        pub timeout_hint: u32,
        /// Reserved.
        pub additional_header: ExtensionObject,
    }
}

binary_struct! {
    /// Header returned with every service response.
    pub struct ResponseHeader {
        /// Time the response was sent.
        pub timestamp: DateTime,
        /// Echo of the request handle.
        pub request_handle: u32,
        /// Overall outcome of the service call.
        pub service_result: StatusCode,
        /// Diagnostics for the service call.
        pub service_diagnostics: DiagnosticInfo,
        /// Strings referenced by diagnostics.
        pub string_table: Vec<String>,
        /// Reserved.
        pub additional_header: ExtensionObject,
    }
}

impl ResponseHeader {
    /// A Good header echoing `request_handle`.
    #[must_use]
    pub fn good(request_handle: u32) -> Self {
        Self {
            timestamp: DateTime::now(),
            request_handle,
            ..Self::default()
        }
    }

    /// A header with the given outcome.
    #[must_use]
    pub fn with_result(request_handle: u32, service_result: StatusCode) -> Self {
        Self {
            service_result,
            ..Self::good(request_handle)
        }
    }
}
