use crate::client::Client;
use crate::error::Result;
use ua_types::service::method::{CallMethodRequest, CallMethodResult, CallRequest};

impl Client {
    /// Call methods. One result per call, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole.
    pub async fn call(&self, methods_to_call: Vec<CallMethodRequest>) -> Result<Vec<CallMethodResult>> {
        let request = CallRequest {
            methods_to_call,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.results)
    }
}
