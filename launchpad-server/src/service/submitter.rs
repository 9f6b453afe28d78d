//! Workflow submitter
//!
//! Builds the create-execution request and sends it exactly once.

use std::sync::Arc;

use launchpad_client::{ClientError, CreateWorkflowExecution};
use launchpad_core::domain::execution::ExecutionRecord;
use launchpad_core::domain::template::Label;
use thiserror::Error;
use tracing::{info, warn};

use crate::repository::WorkflowOrchestrator;
use crate::service::parameters::ResolvedParameters;

/// Label carrying the workspace the run belongs to
pub const WORKSPACE_UID_LABEL: &str = "workspace-uid";
/// Label carrying the annotation task the run was started from
pub const JOB_ID_LABEL: &str = "cvat-job-id";

#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The orchestrator answered with an error status
    #[error("orchestrator rejected {template_uid} (status {status}): {message}")]
    Rejected {
        template_uid: String,
        status: u16,
        message: String,
    },

    /// The orchestrator could not be reached or its answer was unreadable
    #[error("orchestrator unreachable while submitting {template_uid}: {message}")]
    Unreachable {
        template_uid: String,
        message: String,
    },
}

impl SubmissionError {
    fn from_client(template_uid: &str, err: ClientError) -> Self {
        match err {
            ClientError::ApiError { status, message } => Self::Rejected {
                template_uid: template_uid.to_string(),
                status,
                message,
            },
            other => Self::Unreachable {
                template_uid: template_uid.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Labels used to correlate an execution with its workspace and task
pub fn correlation_labels(workspace_uid: &str, task_id: u64) -> Vec<Label> {
    vec![
        Label::new(WORKSPACE_UID_LABEL, workspace_uid),
        Label::new(JOB_ID_LABEL, task_id.to_string()),
    ]
}

pub struct WorkflowSubmitter {
    orchestrator: Arc<dyn WorkflowOrchestrator>,
    namespace: String,
}

impl WorkflowSubmitter {
    pub fn new(orchestrator: Arc<dyn WorkflowOrchestrator>, namespace: impl Into<String>) -> Self {
        Self {
            orchestrator,
            namespace: namespace.into(),
        }
    }

    /// Creates one execution of `template_uid`
    ///
    /// # Arguments
    /// * `template_uid` - Template to run
    /// * `version` - Specific version, or `None` for the latest
    /// * `parameters` - Resolved parameters, sent as-is
    /// * `labels` - Correlation labels
    pub async fn submit(
        &self,
        template_uid: &str,
        version: Option<&str>,
        parameters: ResolvedParameters,
        labels: Vec<Label>,
    ) -> Result<ExecutionRecord, SubmissionError> {
        let body = CreateWorkflowExecution {
            workflow_template_uid: template_uid.to_string(),
            workflow_template_version: version.map(str::to_string),
            parameters: parameters.into_vec(),
            labels,
        };

        info!(
            "Submitting {} with {} parameter(s) to namespace {}",
            template_uid,
            body.parameters.len(),
            self.namespace
        );

        let record = self
            .orchestrator
            .create_execution(&self.namespace, &body)
            .await
            .map_err(|e| {
                warn!("Submission of {} failed: {}", template_uid, e);
                SubmissionError::from_client(template_uid, e)
            })?;

        info!("Execution {} created from {}", record.uid, template_uid);
        Ok(record)
    }
}
