//! Template catalog repository

use async_trait::async_trait;
use launchpad_client::{ClientError, OnepanelClient};
use launchpad_core::domain::task::NodePool;
use launchpad_core::domain::template::WorkflowTemplate;
use launchpad_core::dto::catalog::TemplateList;

/// Read-through access to the remote workflow template catalog
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// Lists templates in a namespace, optionally filtered by label
    async fn list_templates(
        &self,
        namespace: &str,
        labels: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<TemplateList, ClientError>;

    /// Fetches one template version with its declared parameters
    async fn get_template(
        &self,
        namespace: &str,
        uid: &str,
        version: &str,
    ) -> Result<WorkflowTemplate, ClientError>;

    /// Fetches the cluster's node pool parameter
    async fn get_node_pool(&self) -> Result<NodePool, ClientError>;
}

#[async_trait]
impl TemplateCatalog for OnepanelClient {
    async fn list_templates(
        &self,
        namespace: &str,
        labels: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<TemplateList, ClientError> {
        self.list_workflow_templates(namespace, labels, page, page_size)
            .await
    }

    async fn get_template(
        &self,
        namespace: &str,
        uid: &str,
        version: &str,
    ) -> Result<WorkflowTemplate, ClientError> {
        self.get_workflow_template(namespace, uid, version).await
    }

    async fn get_node_pool(&self) -> Result<NodePool, ClientError> {
        OnepanelClient::get_node_pool(self).await
    }
}
