//! In-memory repositories shared by service tests

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use launchpad_client::ClientError;
use launchpad_core::domain::task::{
    AnnotatedObject, DumpFormat, NodePool, NodePoolOption, TaskAnnotations, TaskInfo, TaskLabel,
};
use launchpad_core::domain::template::{
    Label, ParameterSpec, Visibility, WorkflowTemplate,
};
use launchpad_core::dto::catalog::TemplateList;

use crate::repository::{AnnotationStore, DatasetExporter, ExportError, TemplateCatalog};

pub fn task(id: u64, name: &str, labels: &[&str]) -> TaskInfo {
    TaskInfo {
        id,
        name: name.to_string(),
        owner: "annotator".to_string(),
        labels: labels
            .iter()
            .enumerate()
            .map(|(i, l)| TaskLabel {
                id: i as u64 + 1,
                name: l.to_string(),
            })
            .collect(),
    }
}

pub fn template(uid: &str, params: &[(&str, Visibility)]) -> WorkflowTemplate {
    WorkflowTemplate {
        uid: uid.to_string(),
        name: uid.to_string(),
        version: Some("1614632437".to_string()),
        parameters: params
            .iter()
            .map(|(name, visibility)| ParameterSpec {
                name: name.to_string(),
                value: None,
                param_type: Some("input.text".to_string()),
                display_name: None,
                hint: None,
                required: false,
                options: Vec::new(),
                visibility: *visibility,
            })
            .collect(),
        labels: vec![Label::new("used-by", "cvat")],
    }
}

fn not_found(what: &str) -> ClientError {
    ClientError::api_error(404, format!("{} not found", what))
}

#[derive(Default)]
pub struct FakeAnnotations {
    pub tasks: Vec<TaskInfo>,
    pub annotations: TaskAnnotations,
}

impl FakeAnnotations {
    pub fn with_task(task: TaskInfo) -> Self {
        Self {
            tasks: vec![task],
            ..Default::default()
        }
    }

    pub fn with_objects(mut self, shapes: &[u64], tracks: &[u64], tags: &[u64]) -> Self {
        let objects = |ids: &[u64]| {
            ids.iter()
                .map(|&label_id| AnnotatedObject { label_id })
                .collect()
        };
        self.annotations = TaskAnnotations {
            shapes: objects(shapes),
            tracks: objects(tracks),
            tags: objects(tags),
        };
        self
    }
}

#[async_trait]
impl AnnotationStore for FakeAnnotations {
    async fn get_task(&self, task_id: u64) -> Result<TaskInfo, ClientError> {
        self.tasks
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
            .ok_or_else(|| not_found("task"))
    }

    async fn get_annotations(&self, task_id: u64) -> Result<TaskAnnotations, ClientError> {
        self.get_task(task_id).await?;
        Ok(self.annotations.clone())
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    pub templates: Vec<WorkflowTemplate>,
    pub requested_versions: Mutex<Vec<String>>,
    pub list_queries: Mutex<Vec<(Option<String>, u32, u32)>>,
}

impl FakeCatalog {
    pub fn with(templates: Vec<WorkflowTemplate>) -> Self {
        Self {
            templates,
            ..Default::default()
        }
    }
}

#[async_trait]
impl TemplateCatalog for FakeCatalog {
    async fn list_templates(
        &self,
        _namespace: &str,
        labels: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<TemplateList, ClientError> {
        self.list_queries
            .lock()
            .unwrap()
            .push((labels.map(str::to_string), page, page_size));
        Ok(TemplateList {
            count: self.templates.len() as u64,
            total_count: self.templates.len() as u64,
            workflow_templates: self.templates.clone(),
        })
    }

    async fn get_template(
        &self,
        _namespace: &str,
        uid: &str,
        version: &str,
    ) -> Result<WorkflowTemplate, ClientError> {
        self.requested_versions
            .lock()
            .unwrap()
            .push(version.to_string());
        self.templates
            .iter()
            .find(|t| t.uid == uid)
            .cloned()
            .ok_or_else(|| not_found("workflow template"))
    }

    async fn get_node_pool(&self) -> Result<NodePool, ClientError> {
        Ok(NodePool {
            label: "beta.kubernetes.io/instance-type".to_string(),
            options: vec![NodePoolOption {
                name: "CPU: 2, RAM: 8GB".to_string(),
                value: "Standard_D2s_v3".to_string(),
            }],
            hint: None,
            display_name: Some("Node pool".to_string()),
        })
    }
}

/// Exporter that writes a small fixed tree and records every call
pub struct SpyExporter {
    pub formats: Vec<DumpFormat>,
    pub fail_formats: bool,
    pub fail_export: bool,
    pub calls: Mutex<Vec<(u64, String, PathBuf)>>,
}

impl Default for SpyExporter {
    fn default() -> Self {
        Self {
            formats: vec![
                DumpFormat {
                    name: "TFRecord 1.0".to_string(),
                    tag: "cvat_tfrecord".to_string(),
                },
                DumpFormat {
                    name: "COCO 1.0".to_string(),
                    tag: "cvat_coco".to_string(),
                },
            ],
            fail_formats: false,
            fail_export: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl SpyExporter {
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_format(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(_, f, _)| f.clone())
    }

    pub fn last_destination(&self) -> Option<PathBuf> {
        self.calls.lock().unwrap().last().map(|(_, _, d)| d.clone())
    }
}

#[async_trait]
impl DatasetExporter for SpyExporter {
    async fn formats(&self) -> Result<Vec<DumpFormat>, ExportError> {
        if self.fail_formats {
            return Err(ExportError::Remote(ClientError::api_error(502, "bad gateway")));
        }
        Ok(self.formats.clone())
    }

    async fn export(
        &self,
        task_id: u64,
        _owner: &str,
        format: &str,
        destination: &Path,
    ) -> Result<Vec<PathBuf>, ExportError> {
        self.calls
            .lock()
            .unwrap()
            .push((task_id, format.to_string(), destination.to_path_buf()));

        let files = [
            destination.join("label_map.pbtxt"),
            destination.join("default.tfrecord"),
            destination.join("images").join("frame_000000.jpg"),
        ];
        tokio::fs::create_dir_all(destination.join("images")).await?;
        if self.fail_export {
            tokio::fs::write(&files[0], b"partial").await?;
            return Err(ExportError::Remote(ClientError::api_error(500, "export crashed")));
        }
        for file in &files {
            tokio::fs::write(file, b"data").await?;
        }
        Ok(files.to_vec())
    }
}
