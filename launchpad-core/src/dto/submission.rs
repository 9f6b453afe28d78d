//! Submission DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Body of a submit-training-run request
///
/// Every field is optional on the wire; the service validates the request
/// before touching any remote system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitTrainingRun {
    #[serde(default)]
    pub workflow_template: Option<String>,
    #[serde(default)]
    pub workflow_template_version: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub dump_format: Option<String>,
}

impl SubmitTrainingRun {
    /// User parameter values rendered as the strings the orchestrator expects
    ///
    /// Strings pass through untouched, nulls are dropped, everything else is
    /// rendered as its JSON text.
    pub fn parameter_values(&self) -> BTreeMap<String, String> {
        self.parameters
            .iter()
            .filter_map(|(name, value)| {
                let rendered = match value {
                    JsonValue::Null => return None,
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((name.clone(), rendered))
            })
            .collect()
    }
}
