//! Annotation task domain types
//!
//! Read-only views of what the annotation store knows about a task.

use serde::{Deserialize, Serialize};

/// Annotation task metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: u64,
    pub name: String,
    /// Identity of the task owner, passed through to the exporter
    pub owner: String,
    pub labels: Vec<TaskLabel>,
}

impl TaskInfo {
    /// Number of distinct labels (classes) defined on the task
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }
}

/// A label (class) defined on a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLabel {
    pub id: u64,
    pub name: String,
}

/// Annotated objects of a task, reduced to what counting needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskAnnotations {
    #[serde(default)]
    pub shapes: Vec<AnnotatedObject>,
    #[serde(default)]
    pub tracks: Vec<AnnotatedObject>,
    #[serde(default)]
    pub tags: Vec<AnnotatedObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedObject {
    pub label_id: u64,
}

/// Number of annotated objects carrying one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

/// Serialization format an annotation dump can be produced in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpFormat {
    pub name: String,
    pub tag: String,
}

/// Node pool parameter exposed by the cluster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePool {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub options: Vec<NodePoolOption>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePoolOption {
    pub name: String,
    pub value: String,
}
