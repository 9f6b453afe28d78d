//! Workflow execution domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::template::Label;

/// Name/value pair transmitted to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Reference to the template an execution was created from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<serde_json::Value>,
}

/// Acknowledgement of a created execution
///
/// Owned by the orchestrator; Launchpad only hands it back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, alias = "workflowTemplate")]
    pub workflow_template: Option<TemplateRef>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl ExecutionRecord {
    /// Looks up a correlation label by key
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.key == key)
            .map(|l| l.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_orchestrator_execution() {
        let json = r#"{
            "uid": "maskrcnn-training-x7k2p",
            "name": "maskrcnn-training-x7k2p",
            "createdAt": "2021-03-04T05:06:07Z",
            "phase": "Pending",
            "workflowTemplate": {"uid": "maskrcnn-training", "version": "1603245398"},
            "labels": [
                {"key": "workspace-uid", "value": "cvat"},
                {"key": "cvat-job-id", "value": "17"}
            ]
        }"#;

        let record: ExecutionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.uid, "maskrcnn-training-x7k2p");
        assert_eq!(record.namespace, "");
        assert_eq!(
            record.workflow_template.as_ref().map(|t| t.uid.as_str()),
            Some("maskrcnn-training")
        );
        assert_eq!(record.label("cvat-job-id"), Some("17"));
        assert_eq!(record.label("missing"), None);
        assert!(record.created_at.is_some());
    }
}
