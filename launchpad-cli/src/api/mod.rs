//! API client module
//!
//! HTTP client for communicating with the Launchpad server API.

use anyhow::{Context, Result};
use launchpad_core::domain::execution::ExecutionRecord;
use launchpad_core::dto::catalog::{CheckpointKeys, NodePoolResponse, TemplateList, TemplateParameters};
use launchpad_core::dto::submission::SubmitTrainingRun;
use launchpad_core::dto::task::{DumpFormatList, GeneratedPath, ObjectCounts};
use reqwest::Client;

/// HTTP client for the Launchpad server API
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the Launchpad server
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// List workflow templates
    pub async fn list_templates(&self, page: u32, page_size: u32) -> Result<TemplateList> {
        let url = format!("{}/workflow_templates", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("page", page), ("page_size", page_size)])
            .send()
            .await
            .context("Failed to send list templates request")?;

        self.handle_response(response).await
    }

    /// Get the public parameters of a template version
    ///
    /// # Arguments
    /// * `uid` - Template uid
    /// * `version` - Template version, "0" for the latest
    pub async fn get_template_parameters(
        &self,
        uid: &str,
        version: &str,
    ) -> Result<TemplateParameters> {
        let url = format!(
            "{}/workflow_templates/{}/versions/{}",
            self.base_url, uid, version
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send get parameters request")?;

        self.handle_response(response).await
    }

    pub async fn get_node_pool(&self) -> Result<NodePoolResponse> {
        let url = format!("{}/node_pool", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send node pool request")?;

        self.handle_response(response).await
    }

    pub async fn list_dump_formats(&self) -> Result<DumpFormatList> {
        let url = format!("{}/dump_formats", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send dump formats request")?;

        self.handle_response(response).await
    }

    pub async fn get_object_counts(&self, task_id: u64) -> Result<ObjectCounts> {
        let url = format!("{}/tasks/{}/object_counts", self.base_url, task_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send object counts request")?;

        self.handle_response(response).await
    }

    pub async fn get_output_path(&self, task_id: u64, template_uid: &str) -> Result<GeneratedPath> {
        let url = format!("{}/tasks/{}/output_path", self.base_url, task_id);
        let response = self
            .client
            .get(&url)
            .query(&[("uid", template_uid)])
            .send()
            .await
            .context("Failed to send output path request")?;

        self.handle_response(response).await
    }

    pub async fn get_annotation_path(&self, task_id: u64) -> Result<GeneratedPath> {
        let url = format!("{}/tasks/{}/annotation_path", self.base_url, task_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send annotation path request")?;

        self.handle_response(response).await
    }

    /// List checkpoints of a template
    ///
    /// # Arguments
    /// * `uid` - Template uid
    /// * `reference_model` - Only checkpoints whose path contains this model
    pub async fn list_checkpoints(
        &self,
        uid: &str,
        reference_model: Option<&str>,
    ) -> Result<CheckpointKeys> {
        let url = format!("{}/checkpoints", self.base_url);
        let mut query = vec![("uid", uid)];
        if let Some(model) = reference_model {
            query.push(("sys_ref_model", model));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .context("Failed to send list checkpoints request")?;

        self.handle_response(response).await
    }

    /// Submit a training run for a task
    ///
    /// # Returns
    /// The created execution
    pub async fn submit(&self, task_id: u64, req: &SubmitTrainingRun) -> Result<ExecutionRecord> {
        let url = format!("{}/tasks/{}/execute_workflow", self.base_url, task_id);
        let response = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .context("Failed to send submit request")?;

        self.handle_response(response).await
    }

    /// Handle API response and deserialize JSON
    ///
    /// # Arguments
    /// * `response` - The HTTP response
    ///
    /// # Returns
    /// The deserialized response body
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&error_text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or(error_text);
            anyhow::bail!("Request failed with status {}: {}", status, message);
        }

        response
            .json()
            .await
            .context("Failed to parse response JSON")
    }
}
