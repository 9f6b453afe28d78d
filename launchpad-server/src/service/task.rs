//! Task Service
//!
//! Read-only views over annotation tasks: export formats, per-label object
//! counts and previews of the paths a submission would use.

use std::collections::HashMap;
use std::sync::Arc;

use launchpad_client::ClientError;
use launchpad_core::domain::task::{DumpFormat, LabelCount, TaskAnnotations, TaskInfo};
use thiserror::Error;

use crate::repository::{AnnotationStore, DatasetExporter, ExportError};
use crate::service::paths::PathGenerator;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task {0} not found")]
    NotFound(u64),

    #[error("annotation store error: {0}")]
    Remote(#[source] ClientError),

    #[error("exporter error: {0}")]
    Export(#[from] ExportError),
}

pub struct TaskService {
    annotations: Arc<dyn AnnotationStore>,
    exporter: Arc<dyn DatasetExporter>,
    paths: Arc<PathGenerator>,
}

impl TaskService {
    pub fn new(
        annotations: Arc<dyn AnnotationStore>,
        exporter: Arc<dyn DatasetExporter>,
        paths: Arc<PathGenerator>,
    ) -> Self {
        Self {
            annotations,
            exporter,
            paths,
        }
    }

    /// Formats the exporter can produce
    pub async fn dump_formats(&self) -> Result<Vec<DumpFormat>, TaskError> {
        Ok(self.exporter.formats().await?)
    }

    /// Number of shapes and tracks per label, for every label of the task
    pub async fn object_counts(&self, task_id: u64) -> Result<Vec<LabelCount>, TaskError> {
        let task = self.task(task_id).await?;
        let annotations = self
            .annotations
            .get_annotations(task_id)
            .await
            .map_err(|e| remote(task_id, e))?;

        Ok(count_objects(&task, &annotations))
    }

    /// Output path a run of `template_uid` on this task would write to
    pub async fn output_path(&self, task_id: u64, template_uid: &str) -> Result<String, TaskError> {
        let task = self.task(task_id).await?;
        Ok(self.paths.output_path(&task.name, template_uid))
    }

    /// Path the task's dataset would be uploaded to
    pub async fn annotation_path(&self, task_id: u64) -> Result<String, TaskError> {
        let task = self.task(task_id).await?;
        Ok(self.paths.dataset_path(&task.name))
    }

    async fn task(&self, task_id: u64) -> Result<TaskInfo, TaskError> {
        self.annotations
            .get_task(task_id)
            .await
            .map_err(|e| remote(task_id, e))
    }
}

fn remote(task_id: u64, err: ClientError) -> TaskError {
    if err.is_not_found() {
        TaskError::NotFound(task_id)
    } else {
        TaskError::Remote(err)
    }
}

/// Counts shapes and tracks by label name, sorted by name
///
/// Tags are image-level and not counted. Objects whose label is not part of
/// the task are ignored.
pub fn count_objects(task: &TaskInfo, annotations: &TaskAnnotations) -> Vec<LabelCount> {
    let mut by_id: HashMap<u64, u64> = task.labels.iter().map(|l| (l.id, 0)).collect();

    for object in annotations.shapes.iter().chain(&annotations.tracks) {
        if let Some(count) = by_id.get_mut(&object.label_id) {
            *count += 1;
        }
    }

    let mut counts: Vec<LabelCount> = task
        .labels
        .iter()
        .map(|l| LabelCount {
            label: l.name.clone(),
            count: by_id.get(&l.id).copied().unwrap_or(0),
        })
        .collect();
    counts.sort_by(|a, b| a.label.cmp(&b.label));
    counts
}
