//! Launchpad HTTP Clients
//!
//! Type-safe HTTP clients for the remote systems a training-run submission
//! touches:
//!
//! - [`OnepanelClient`]: workflow template catalog, cluster configuration and
//!   workflow executions
//! - [`AnnotationClient`]: annotation tasks, their labels and annotations, and
//!   dataset exports
//!
//! Every call is a single attempt; failures surface as [`ClientError`] and
//! retry policy is left to the caller.
//!
//! # Example
//!
//! ```no_run
//! use launchpad_client::OnepanelClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = OnepanelClient::new("http://localhost:8888").with_token("secret");
//!
//!     let templates = client
//!         .list_workflow_templates("default", Some("key=used-by,value=cvat"), 1, 100)
//!         .await?;
//!
//!     println!("Found {} templates", templates.count);
//!     Ok(())
//! }
//! ```

mod annotations;
mod config;
pub mod error;
mod executions;
mod templates;

// Re-export commonly used types
pub use annotations::{AnnotationClient, ExportPolling};
pub use error::{ClientError, Result};
pub use executions::CreateWorkflowExecution;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// HTTP client for the Onepanel API
///
/// Covers the catalog (workflow templates), cluster configuration (node pools)
/// and the orchestrator (workflow executions). All calls are namespace-scoped
/// except the configuration lookup.
#[derive(Debug, Clone)]
pub struct OnepanelClient {
    /// Base URL of the API (e.g., "http://localhost:8888")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Bearer token sent with every request
    token: Option<String>,
}

impl OnepanelClient {
    /// Create a new Onepanel client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the Onepanel API
    ///
    /// # Example
    /// ```
    /// use launchpad_client::OnepanelClient;
    ///
    /// let client = OnepanelClient::new("http://localhost:8888");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new Onepanel client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    /// Timeouts configured here are the only timeouts applied to remote calls.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        }
    }

    /// Authenticate every request with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Check the status code and deserialize the JSON body of a response
pub(crate) async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = check_status(response).await?;

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Turn a non-success status into an [`ClientError::ApiError`]
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OnepanelClient::new("http://localhost:8888");
        assert_eq!(client.base_url(), "http://localhost:8888");
        assert!(client.token.is_none());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = OnepanelClient::new("http://localhost:8888/");
        assert_eq!(client.base_url(), "http://localhost:8888");
    }

    #[test]
    fn test_client_with_token() {
        let client = OnepanelClient::with_client("http://localhost:8888", Client::new())
            .with_token("secret");
        assert_eq!(client.token.as_deref(), Some("secret"));
    }
}
