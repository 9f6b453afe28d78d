//! Annotation store repository

use async_trait::async_trait;
use launchpad_client::{AnnotationClient, ClientError};
use launchpad_core::domain::task::{TaskAnnotations, TaskInfo};

/// Read-only access to annotation tasks
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Fetches task metadata (name, owner, labels)
    async fn get_task(&self, task_id: u64) -> Result<TaskInfo, ClientError>;

    /// Fetches the annotated objects of a task
    async fn get_annotations(&self, task_id: u64) -> Result<TaskAnnotations, ClientError>;
}

#[async_trait]
impl AnnotationStore for AnnotationClient {
    async fn get_task(&self, task_id: u64) -> Result<TaskInfo, ClientError> {
        AnnotationClient::get_task(self, task_id).await
    }

    async fn get_annotations(&self, task_id: u64) -> Result<TaskAnnotations, ClientError> {
        AnnotationClient::get_annotations(self, task_id).await
    }
}
