//! Orchestrator repository

use async_trait::async_trait;
use launchpad_client::{ClientError, CreateWorkflowExecution, OnepanelClient};
use launchpad_core::domain::execution::ExecutionRecord;

/// Remote job orchestration service
#[async_trait]
pub trait WorkflowOrchestrator: Send + Sync {
    /// Creates one execution of a template
    async fn create_execution(
        &self,
        namespace: &str,
        body: &CreateWorkflowExecution,
    ) -> Result<ExecutionRecord, ClientError>;
}

#[async_trait]
impl WorkflowOrchestrator for OnepanelClient {
    async fn create_execution(
        &self,
        namespace: &str,
        body: &CreateWorkflowExecution,
    ) -> Result<ExecutionRecord, ClientError> {
        self.create_workflow_execution(namespace, body).await
    }
}
