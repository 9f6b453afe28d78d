//! Workflow template domain types
//!
//! A workflow template is a named, versioned job definition owned by the remote
//! catalog. Launchpad never mutates templates; it only reads the parameters they
//! declare to decide what to compute and what to send.

use serde::{Deserialize, Deserializer, Serialize};

/// Version string the catalog understands as "latest".
pub const LATEST_VERSION: &str = "0";

/// Workflow template as returned by the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_version")]
    pub version: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl WorkflowTemplate {
    /// Returns true if the template declares a parameter with this name
    pub fn declares(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }

    /// Names of every declared parameter, in declaration order
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Parameters a user is allowed to see and edit
    pub fn public_parameters(&self) -> Vec<ParameterSpec> {
        self.parameters
            .iter()
            .filter(|p| p.visibility == Visibility::Public)
            .cloned()
            .collect()
    }
}

/// A parameter declared by a workflow template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    /// Default value, if the template specifies one
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "type", default)]
    pub param_type: Option<String>,
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub required: bool,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub options: Vec<ParameterOption>,
    #[serde(default)]
    pub visibility: Visibility,
}

/// Who may see a declared parameter
///
/// Anything the catalog reports other than `public` is treated as private.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    #[serde(other)]
    Private,
}

/// One choice of a select-style parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterOption {
    pub name: String,
    pub value: String,
}

/// Key/value label attached to templates and executions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Map a user-facing version to the one the catalog expects
///
/// Missing, empty and `"none"` versions all mean the latest version.
pub fn normalize_version(version: Option<&str>) -> String {
    match version.map(str::trim) {
        None | Some("") | Some("none") => LATEST_VERSION.to_string(),
        Some(v) => v.to_string(),
    }
}

// The catalog encodes int64 versions as strings, but older deployments send numbers.
fn deserialize_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_catalog_template() {
        let json = r#"{
            "uid": "maskrcnn-training",
            "name": "MaskRCNN Training",
            "version": 1603245398,
            "parameters": [
                {"name": "cvat-annotation-path", "value": null, "visibility": "private"},
                {"name": "epochs", "value": "10", "type": "input.number",
                 "displayName": "Epochs", "required": true, "visibility": "public"},
                {"name": "sys-node-pool", "type": "select.nodepool", "options": null,
                 "visibility": "internal"}
            ]
        }"#;

        let template: WorkflowTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(template.version.as_deref(), Some("1603245398"));
        assert!(template.declares("cvat-annotation-path"));
        assert!(!template.declares("dump-format"));

        let epochs = &template.parameters[1];
        assert_eq!(epochs.display_name.as_deref(), Some("Epochs"));
        assert!(epochs.required);
        assert_eq!(template.parameters[2].visibility, Visibility::Private);
        assert!(template.parameters[2].options.is_empty());
    }

    #[test]
    fn test_public_parameters_filters_private() {
        let json = r#"{"uid": "t", "parameters": [
            {"name": "a", "visibility": "public"},
            {"name": "b", "visibility": "private"},
            {"name": "c"}
        ]}"#;
        let template: WorkflowTemplate = serde_json::from_str(json).unwrap();

        let public = template.public_parameters();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].name, "a");
        assert_eq!(template.parameter_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_normalize_version() {
        assert_eq!(normalize_version(None), "0");
        assert_eq!(normalize_version(Some("none")), "0");
        assert_eq!(normalize_version(Some("")), "0");
        assert_eq!(normalize_version(Some("42")), "42");
    }
}
