use crate::client::Client;
use crate::error::Result;
use ua_types::StatusCode;
use ua_types::service::node_management::{
    AddNodesItem, AddNodesRequest, AddNodesResult, AddReferencesItem, AddReferencesRequest,
    DeleteNodesItem, DeleteNodesRequest, DeleteReferencesItem, DeleteReferencesRequest,
};

impl Client {
    /// Add nodes to the address space.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole.
    pub async fn add_nodes(&self, nodes_to_add: Vec<AddNodesItem>) -> Result<Vec<AddNodesResult>> {
        let request = AddNodesRequest {
            nodes_to_add,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.results)
    }

    /// Add references between nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole.
    pub async fn add_references(&self, references_to_add: Vec<AddReferencesItem>) -> Result<Vec<StatusCode>> {
        let request = AddReferencesRequest {
            references_to_add,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.results)
    }

    /// Delete nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole.
    pub async fn delete_nodes(&self, nodes_to_delete: Vec<DeleteNodesItem>) -> Result<Vec<StatusCode>> {
        let request = DeleteNodesRequest {
            nodes_to_delete,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.results)
    }

    /// Delete references.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole.
    pub async fn delete_references(
        &self,
        references_to_delete: Vec<DeleteReferencesItem>,
    ) -> Result<Vec<StatusCode>> {
        let request = DeleteReferencesRequest {
            references_to_delete,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.results)
    }
}
