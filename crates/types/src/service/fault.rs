//! The generic service fault.

use crate::header::ResponseHeader;
use crate::service::ServiceResponse;

/// Binary encoding id of [`ServiceFault`].
pub const SERVICE_FAULT_ID: u32 = 397;

binary_struct! {
    /// Sent instead of the expected response when a service fails as a whole.
    pub struct ServiceFault {
        /// Carries the failing status and the original request handle.
        pub response_header: ResponseHeader,
    }
}

impl ServiceResponse for ServiceFault {
    const TYPE_ID: u32 = SERVICE_FAULT_ID;

    fn response_header(&self) -> &ResponseHeader {
        &self.response_header
    }

    fn from_response_header(response_header: ResponseHeader) -> Self {
        Self { response_header }
    }
}
