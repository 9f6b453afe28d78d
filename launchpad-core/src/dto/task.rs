//! Task DTOs

use serde::{Deserialize, Serialize};

use crate::domain::task::{DumpFormat, LabelCount};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpFormatList {
    pub dump_formats: Vec<DumpFormat>,
}

/// Per-label object counts of a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectCounts {
    pub task_id: u64,
    pub counts: Vec<LabelCount>,
}

/// A storage path computed for preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPath {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPathQuery {
    pub uid: String,
}
