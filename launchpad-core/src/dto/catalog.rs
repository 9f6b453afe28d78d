//! Catalog DTOs

use serde::{Deserialize, Serialize};

use crate::domain::task::NodePool;
use crate::domain::template::{ParameterSpec, WorkflowTemplate};

/// One page of workflow templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateList {
    #[serde(default)]
    pub count: u64,
    #[serde(default, alias = "totalCount")]
    pub total_count: u64,
    #[serde(default, alias = "workflowTemplates")]
    pub workflow_templates: Vec<WorkflowTemplate>,
}

/// Paging for template listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Parameters a user may fill in for a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateParameters {
    pub parameters: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePoolResponse {
    pub node_pool: NodePool,
}

/// Filter for listing stored model checkpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointQuery {
    pub uid: String,
    #[serde(default)]
    pub sys_ref_model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointKeys {
    pub keys: Vec<String>,
}
