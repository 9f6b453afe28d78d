//! Cluster configuration endpoints

use crate::error::Result;
use crate::{OnepanelClient, handle_response};
use launchpad_core::domain::task::NodePool;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ConfigResponse {
    #[serde(alias = "nodePool")]
    node_pool: NodePool,
}

impl OnepanelClient {
    /// Get the node pool parameter of the cluster configuration
    pub async fn get_node_pool(&self) -> Result<NodePool> {
        let url = format!("{}/apis/v1beta1/config", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;

        let config: ConfigResponse = handle_response(response).await?;
        Ok(config.node_pool)
    }
}
