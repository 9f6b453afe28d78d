//! Workflow execution endpoints

use crate::error::Result;
use crate::{OnepanelClient, handle_response};
use launchpad_core::domain::execution::{ExecutionRecord, Parameter};
use launchpad_core::domain::template::Label;
use serde::Serialize;

/// Body of a create-execution call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowExecution {
    pub workflow_template_uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_template_version: Option<String>,
    pub parameters: Vec<Parameter>,
    pub labels: Vec<Label>,
}

impl OnepanelClient {
    /// Create a workflow execution
    ///
    /// # Arguments
    /// * `namespace` - The namespace to run in
    /// * `body` - Template reference, parameters and labels
    ///
    /// # Returns
    /// The orchestrator's acknowledgement, with `namespace` filled in
    pub async fn create_workflow_execution(
        &self,
        namespace: &str,
        body: &CreateWorkflowExecution,
    ) -> Result<ExecutionRecord> {
        let url = format!(
            "{}/apis/v1beta1/{}/workflow_executions",
            self.base_url, namespace
        );
        let response = self
            .authorize(self.client.post(&url).json(body))
            .send()
            .await?;

        let mut record: ExecutionRecord = handle_response(response).await?;
        if record.namespace.is_empty() {
            record.namespace = namespace.to_string();
        }

        Ok(record)
    }
}
