//! Annotation store client
//!
//! Reads task metadata and annotations, lists the dataset formats the store can
//! export, and downloads dataset exports.

use std::time::Duration;

use launchpad_core::domain::task::{DumpFormat, TaskAnnotations, TaskInfo, TaskLabel};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::{check_status, handle_response};

/// HTTP client for the annotation store API
#[derive(Debug, Clone)]
pub struct AnnotationClient {
    base_url: String,
    client: Client,
    token: Option<String>,
}

/// How long to wait for a dataset export to be prepared
#[derive(Debug, Clone, Copy)]
pub struct ExportPolling {
    /// Delay between readiness checks
    pub interval: Duration,
    /// Readiness checks before giving up
    pub max_polls: u32,
}

impl Default for ExportPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_polls: 200,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    id: u64,
    name: String,
    #[serde(default)]
    owner: Option<JsonValue>,
    #[serde(default)]
    labels: Vec<TaskLabel>,
}

impl From<TaskResponse> for TaskInfo {
    fn from(task: TaskResponse) -> Self {
        // Older servers send the owner id, newer ones a user object.
        let owner = match task.owner {
            Some(JsonValue::Object(user)) => user
                .get("username")
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .unwrap_or_default(),
            Some(JsonValue::String(name)) => name,
            Some(JsonValue::Number(id)) => id.to_string(),
            _ => String::new(),
        };

        Self {
            id: task.id,
            name: task.name,
            owner,
            labels: task.labels,
        }
    }
}

impl AnnotationClient {
    /// Create a new annotation store client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the annotation store (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new annotation store client with a custom HTTP client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        }
    }

    /// Authenticate every request with an API token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL of the annotation store
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Token {}", token)),
            None => builder,
        }
    }

    /// Get task metadata, including its labels
    pub async fn get_task(&self, task_id: u64) -> Result<TaskInfo> {
        let url = format!("{}/api/v1/tasks/{}", self.base_url, task_id);
        let response = self.authorize(self.client.get(&url)).send().await?;

        let task: TaskResponse = handle_response(response).await?;
        Ok(task.into())
    }

    /// Get all annotations of a task
    pub async fn get_annotations(&self, task_id: u64) -> Result<TaskAnnotations> {
        let url = format!("{}/api/v1/tasks/{}/annotations", self.base_url, task_id);
        let response = self.authorize(self.client.get(&url)).send().await?;

        handle_response(response).await
    }

    /// List the dataset formats the store can export
    pub async fn list_dataset_formats(&self) -> Result<Vec<DumpFormat>> {
        let url = format!("{}/api/v1/server/dataset/formats", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;

        handle_response(response).await
    }

    /// Export a task's dataset and download the resulting archive
    ///
    /// The store prepares exports asynchronously: it answers 202 while the
    /// export is being built and 201 once it is ready for download.
    ///
    /// # Arguments
    /// * `task_id` - The task to export
    /// * `format` - Dump format tag
    /// * `polling` - Readiness polling bounds
    pub async fn export_dataset(
        &self,
        task_id: u64,
        format: &str,
        polling: ExportPolling,
    ) -> Result<Vec<u8>> {
        let url = format!("{}/api/v1/tasks/{}/dataset", self.base_url, task_id);

        let mut polls = 0;
        loop {
            let response = self
                .authorize(self.client.get(&url).query(&[("format", format)]))
                .send()
                .await?;

            match response.status() {
                StatusCode::ACCEPTED => {
                    polls += 1;
                    if polls >= polling.max_polls {
                        return Err(ClientError::NotReady {
                            operation: format!("dataset export of task {} as {}", task_id, format),
                            polls,
                        });
                    }
                    debug!(
                        "Export of task {} as {} not ready yet (poll {})",
                        task_id, format, polls
                    );
                    tokio::time::sleep(polling.interval).await;
                }
                _ => {
                    check_status(response).await?;
                    break;
                }
            }
        }

        let response = self
            .authorize(
                self.client
                    .get(&url)
                    .query(&[("format", format), ("action", "download")]),
            )
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_owner_variants() {
        let with_user: TaskResponse = serde_json::from_str(
            r#"{"id": 3, "name": "demo", "owner": {"id": 1, "username": "alice"},
                "labels": [{"id": 1, "name": "car"}]}"#,
        )
        .unwrap();
        let task: TaskInfo = with_user.into();
        assert_eq!(task.owner, "alice");
        assert_eq!(task.label_count(), 1);

        let with_id: TaskResponse =
            serde_json::from_str(r#"{"id": 3, "name": "demo", "owner": 7}"#).unwrap();
        let task: TaskInfo = with_id.into();
        assert_eq!(task.owner, "7");
        assert!(task.labels.is_empty());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = AnnotationClient::new("http://localhost:8080/").with_token("t");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_default_polling() {
        let polling = ExportPolling::default();
        assert_eq!(polling.interval, Duration::from_secs(3));
        assert_eq!(polling.max_polls, 200);
    }
}
