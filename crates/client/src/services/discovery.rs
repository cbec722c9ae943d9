use crate::client::Client;
use crate::error::Result;
use ua_types::service::discovery::{
    ApplicationDescription, EndpointDescription, FindServersRequest, GetEndpointsRequest,
};

impl Client {
    /// Endpoints offered by the server at the configured endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn get_endpoints(&self) -> Result<Vec<EndpointDescription>> {
        let request = GetEndpointsRequest {
            endpoint_url: self.inner.config.endpoint_url.clone(),
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.endpoints)
    }

    /// Servers known to the server, optionally filtered by URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn find_servers(&self, server_uris: Vec<String>) -> Result<Vec<ApplicationDescription>> {
        let request = FindServersRequest {
            endpoint_url: self.inner.config.endpoint_url.clone(),
            server_uris,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.servers)
    }
}
