use crate::client::Client;
use crate::error::Result;
use ua_types::service::attribute::{ReadRequest, ReadValueId, WriteRequest, WriteValue};
use ua_types::{DataValue, NodeId, StatusCode};

impl Client {
    /// Read attributes. One value per entry of `request.nodes_to_read`,
    /// in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole. Per node failures are reported in each value's status.
    pub async fn read(&self, request: ReadRequest) -> Result<Vec<DataValue>> {
        Ok(self.send_checked(request).await?.results)
    }

    /// Read the value attribute of each node.
    ///
    /// # Errors
    ///
    /// See [`Client::read`].
    pub async fn read_values(&self, node_ids: impl IntoIterator<Item = NodeId>) -> Result<Vec<DataValue>> {
        let request = ReadRequest {
            nodes_to_read: node_ids.into_iter().map(ReadValueId::value_of).collect(),
            ..Default::default()
        };
        self.read(request).await
    }

    /// Write attributes. One status per value, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole.
    pub async fn write(&self, nodes_to_write: Vec<WriteValue>) -> Result<Vec<StatusCode>> {
        let request = WriteRequest {
            nodes_to_write,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.results)
    }
}
