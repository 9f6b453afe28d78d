//! Workflow template catalog endpoints

use crate::error::Result;
use crate::{OnepanelClient, handle_response};
use launchpad_core::domain::template::WorkflowTemplate;
use launchpad_core::dto::catalog::TemplateList;

impl OnepanelClient {
    /// List workflow templates in a namespace
    ///
    /// # Arguments
    /// * `namespace` - The namespace to list
    /// * `labels` - Optional label filter (e.g., "key=used-by,value=cvat")
    /// * `page` - 1-based page number
    /// * `page_size` - Templates per page
    pub async fn list_workflow_templates(
        &self,
        namespace: &str,
        labels: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<TemplateList> {
        let url = format!(
            "{}/apis/v1beta1/{}/workflow_templates",
            self.base_url, namespace
        );

        let mut query = vec![
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        if let Some(labels) = labels {
            query.push(("labels", labels.to_string()));
        }

        let response = self
            .authorize(self.client.get(&url).query(&query))
            .send()
            .await?;

        handle_response(response).await
    }

    /// Get one version of a workflow template, including its declared parameters
    ///
    /// # Arguments
    /// * `namespace` - The namespace owning the template
    /// * `uid` - Template uid
    /// * `version` - Template version; "0" selects the latest
    pub async fn get_workflow_template(
        &self,
        namespace: &str,
        uid: &str,
        version: &str,
    ) -> Result<WorkflowTemplate> {
        let url = format!(
            "{}/apis/v1beta1/{}/workflow_templates/{}/versions/{}",
            self.base_url, namespace, uid, version
        );
        let response = self.authorize(self.client.get(&url)).send().await?;

        handle_response(response).await
    }
}
