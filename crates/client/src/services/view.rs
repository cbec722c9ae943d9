use crate::client::Client;
use crate::error::Result;
use ua_types::NodeId;
use ua_types::service::view::{
    BrowseNextRequest, BrowsePath, BrowsePathResult, BrowseRequest, BrowseResult,
    RegisterNodesRequest, TranslateBrowsePathsToNodeIdsRequest, UnregisterNodesRequest,
};

impl Client {
    /// Browse references. One result per node in `request.nodes_to_browse`.
    ///
    /// The continuation points of the results replace those held from any
    /// earlier browse; [`Client::browse_next`] continues from them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole. The held continuation points are cleared either way.
    pub async fn browse(&self, request: BrowseRequest) -> Result<Vec<BrowseResult>> {
        self.inner.continuation.clear();
        let results = self.send_checked(request).await?.results;
        self.inner.continuation.replace_from(&results);
        Ok(results)
    }

    /// Continue the last browse from its continuation points.
    ///
    /// Returns an empty list without contacting the server when no
    /// continuation points are held.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole. The held continuation points are cleared either way.
    pub async fn browse_next(&self) -> Result<Vec<BrowseResult>> {
        let continuation_points = self.inner.continuation.take();
        if continuation_points.is_empty() {
            return Ok(Vec::new());
        }

        let request = BrowseNextRequest {
            release_continuation_points: false,
            continuation_points,
            ..Default::default()
        };
        let results = self.send_checked(request).await?.results;
        self.inner.continuation.replace_from(&results);
        Ok(results)
    }

    /// Release the held continuation points on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. The held points are cleared
    /// either way.
    pub async fn release_continuation_points(&self) -> Result<()> {
        let continuation_points = self.inner.continuation.take();
        if continuation_points.is_empty() {
            return Ok(());
        }

        let request = BrowseNextRequest {
            release_continuation_points: true,
            continuation_points,
            ..Default::default()
        };
        self.send_checked(request).await?;
        Ok(())
    }

    /// Resolve browse paths to node ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole.
    pub async fn translate_browse_paths_to_node_ids(
        &self,
        browse_paths: Vec<BrowsePath>,
    ) -> Result<Vec<BrowsePathResult>> {
        let request = TranslateBrowsePathsToNodeIdsRequest {
            browse_paths,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.results)
    }

    /// Register nodes for repeated access. Returns the ids to use instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn register_nodes(&self, nodes_to_register: Vec<NodeId>) -> Result<Vec<NodeId>> {
        let request = RegisterNodesRequest {
            nodes_to_register,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.registered_node_ids)
    }

    /// Release nodes registered with [`Client::register_nodes`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn unregister_nodes(&self, nodes_to_unregister: Vec<NodeId>) -> Result<()> {
        let request = UnregisterNodesRequest {
            nodes_to_unregister,
            ..Default::default()
        };
        self.send_checked(request).await?;
        Ok(())
    }
}
