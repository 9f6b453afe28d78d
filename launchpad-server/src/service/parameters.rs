//! Parameter resolution
//!
//! Merges the values a user submitted with values computed from the task,
//! producing the exact parameter list sent to the orchestrator. Computed
//! parameters are only ever sent when the template declares them.

use std::collections::BTreeMap;

use launchpad_core::domain::execution::Parameter;
use thiserror::Error;

/// Object storage prefix of the exported dataset
pub const ANNOTATION_PATH: &str = "cvat-annotation-path";
/// Object storage prefix for model outputs
pub const OUTPUT_PATH: &str = "cvat-output-path";
/// Number of classes to train
pub const NUM_CLASSES: &str = "cvat-num-classes";
/// Tag of the dump format the dataset was exported in
pub const DUMP_FORMAT: &str = "dump-format";

/// Names that are always computed and never accepted from the user
const COMPUTED: [&str; 3] = [ANNOTATION_PATH, NUM_CLASSES, OUTPUT_PATH];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid class offset entry '{0}', expected <template-uid>=<offset>")]
pub struct ClassOffsetParseError(String);

/// Per-template adjustment of the class count
///
/// Some training conventions reserve extra classes (instance segmentation
/// reserves one for the background). The offset is added to the task's label
/// count for templates listed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOffsets(BTreeMap<String, u32>);

impl ClassOffsets {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds or replaces the offset for a template uid
    pub fn with(mut self, template_uid: impl Into<String>, offset: u32) -> Self {
        self.0.insert(template_uid.into(), offset);
        self
    }

    /// Parses `uid=offset` pairs separated by commas
    ///
    /// Blank input yields an empty table.
    pub fn parse(spec: &str) -> Result<Self, ClassOffsetParseError> {
        let mut offsets = Self::empty();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (uid, offset) = entry
                .split_once('=')
                .ok_or_else(|| ClassOffsetParseError(entry.to_string()))?;
            let uid = uid.trim();
            let offset = offset
                .trim()
                .parse::<u32>()
                .map_err(|_| ClassOffsetParseError(entry.to_string()))?;
            if uid.is_empty() {
                return Err(ClassOffsetParseError(entry.to_string()));
            }
            offsets = offsets.with(uid, offset);
        }
        Ok(offsets)
    }

    pub fn offset_for(&self, template_uid: &str) -> u32 {
        self.0.get(template_uid).copied().unwrap_or(0)
    }
}

impl Default for ClassOffsets {
    fn default() -> Self {
        Self::empty().with("maskrcnn-training", 1)
    }
}

/// Facts about the task and its export that feed computed parameters
#[derive(Debug, Clone, Default)]
pub struct TaskFacts {
    pub label_count: usize,
    pub annotation_path: Option<String>,
    pub output_path: Option<String>,
    pub dump_format: Option<String>,
    pub template_uid: String,
}

/// Final parameter list; names are unique
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedParameters {
    params: Vec<Parameter>,
}

impl ResolvedParameters {
    /// Sets a parameter, replacing any existing value of the same name
    fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.params.push(Parameter::new(name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn into_vec(self) -> Vec<Parameter> {
        self.params
    }
}

/// Resolves the parameters of one submission
#[derive(Debug, Clone, Default)]
pub struct ParameterResolver {
    offsets: ClassOffsets,
}

impl ParameterResolver {
    pub fn new(offsets: ClassOffsets) -> Self {
        Self { offsets }
    }

    /// Builds the parameter list for a template
    ///
    /// # Arguments
    /// * `declared` - Parameter names the template declares
    /// * `user_values` - Values the user submitted
    /// * `facts` - Values computed from the task
    pub fn resolve(
        &self,
        declared: &[&str],
        user_values: &BTreeMap<String, String>,
        facts: &TaskFacts,
    ) -> ResolvedParameters {
        let declares = |name: &str| declared.contains(&name);
        let mut resolved = ResolvedParameters::default();

        for (name, value) in user_values {
            if COMPUTED.contains(&name.as_str()) {
                continue;
            }
            resolved.set(name, value.as_str());
        }

        if declares(ANNOTATION_PATH) {
            if let Some(path) = &facts.annotation_path {
                resolved.set(ANNOTATION_PATH, path.as_str());
            }
        }

        if declares(DUMP_FORMAT) {
            if let Some(format) = &facts.dump_format {
                resolved.set(DUMP_FORMAT, format.as_str());
            }
        }

        if declares(NUM_CLASSES) {
            let offset = self.offsets.offset_for(&facts.template_uid) as usize;
            resolved.set(NUM_CLASSES, (facts.label_count + offset).to_string());
        }

        if declares(OUTPUT_PATH) {
            if let Some(path) = &facts.output_path {
                resolved.set(OUTPUT_PATH, path.as_str());
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn user(values: &[(&str, &str)]) -> BTreeMap<String, String> {
        values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn facts(template_uid: &str, label_count: usize) -> TaskFacts {
        TaskFacts {
            label_count,
            annotation_path: Some("annotation-dump/demo/03042021050607/".to_string()),
            output_path: Some("workflow-data/output/demo/x/03042021050607/".to_string()),
            dump_format: Some("cvat_tfrecord".to_string()),
            template_uid: template_uid.to_string(),
        }
    }

    #[test]
    fn test_instance_segmentation_offset() {
        let resolver = ParameterResolver::default();
        let declared = [NUM_CLASSES];

        let resolved = resolver.resolve(&declared, &user(&[]), &facts("maskrcnn-training", 5));
        assert_eq!(resolved.get(NUM_CLASSES), Some("6"));

        let resolved = resolver.resolve(
            &declared,
            &user(&[]),
            &facts("tf-object-detection-training", 5),
        );
        assert_eq!(resolved.get(NUM_CLASSES), Some("5"));
    }

    #[test]
    fn test_offset_table_is_extensible() {
        let resolver = ParameterResolver::new(ClassOffsets::empty().with("yolo-seg", 2));
        let resolved = resolver.resolve(&[NUM_CLASSES], &user(&[]), &facts("yolo-seg", 3));
        assert_eq!(resolved.get(NUM_CLASSES), Some("5"));

        let resolved =
            resolver.resolve(&[NUM_CLASSES], &user(&[]), &facts("maskrcnn-training", 3));
        assert_eq!(resolved.get(NUM_CLASSES), Some("3"));
    }

    #[test]
    fn test_computed_names_not_sent_unless_declared() {
        let resolver = ParameterResolver::default();
        let resolved = resolver.resolve(
            &["epochs"],
            &user(&[("epochs", "10")]),
            &facts("maskrcnn-training", 4),
        );

        assert_eq!(resolved.len(), 1);
        assert!(!resolved.contains(ANNOTATION_PATH));
        assert!(!resolved.contains(NUM_CLASSES));
        assert!(!resolved.contains(DUMP_FORMAT));
        assert!(!resolved.contains(OUTPUT_PATH));
    }

    #[test]
    fn test_user_cannot_spoof_computed_values() {
        let resolver = ParameterResolver::default();
        let resolved = resolver.resolve(
            &[ANNOTATION_PATH, NUM_CLASSES, OUTPUT_PATH],
            &user(&[
                (ANNOTATION_PATH, "s3://elsewhere/"),
                (NUM_CLASSES, "999"),
                (OUTPUT_PATH, "somewhere/"),
            ]),
            &facts("tf-object-detection-training", 2),
        );

        assert_eq!(
            resolved.get(ANNOTATION_PATH),
            Some("annotation-dump/demo/03042021050607/")
        );
        assert_eq!(resolved.get(NUM_CLASSES), Some("2"));
        assert_eq!(
            resolved.get(OUTPUT_PATH),
            Some("workflow-data/output/demo/x/03042021050607/")
        );
    }

    #[test]
    fn test_undeclared_computed_names_dropped_from_user_values() {
        let resolver = ParameterResolver::default();
        let resolved = resolver.resolve(
            &[],
            &user(&[(ANNOTATION_PATH, "spoofed/"), ("batch-size", "8")]),
            &facts("t", 1),
        );

        assert!(!resolved.contains(ANNOTATION_PATH));
        assert_eq!(resolved.get("batch-size"), Some("8"));
    }

    #[test]
    fn test_dump_format_overrides_user_value_when_declared() {
        let resolver = ParameterResolver::default();

        let resolved = resolver.resolve(
            &[DUMP_FORMAT],
            &user(&[(DUMP_FORMAT, "bogus_format")]),
            &facts("t", 1),
        );
        assert_eq!(resolved.get(DUMP_FORMAT), Some("cvat_tfrecord"));

        // Undeclared: the user's value passes through like any other parameter
        let resolved =
            resolver.resolve(&[], &user(&[(DUMP_FORMAT, "coco")]), &facts("t", 1));
        assert_eq!(resolved.get(DUMP_FORMAT), Some("coco"));
    }

    #[test]
    fn test_names_are_unique() {
        let resolver = ParameterResolver::default();
        let declared = [ANNOTATION_PATH, DUMP_FORMAT, NUM_CLASSES, OUTPUT_PATH, "epochs"];
        let resolved = resolver.resolve(
            &declared,
            &user(&[
                ("epochs", "3"),
                (DUMP_FORMAT, "x"),
                (NUM_CLASSES, "1"),
                ("extra", "y"),
            ]),
            &facts("maskrcnn-training", 7),
        );

        let names: HashSet<&str> = resolved.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), resolved.len());
        assert_eq!(resolved.len(), 6);
    }

    #[test]
    fn test_parse_class_offsets() {
        let offsets = ClassOffsets::parse("maskrcnn-training=1, yolo-seg = 2").unwrap();
        assert_eq!(offsets.offset_for("maskrcnn-training"), 1);
        assert_eq!(offsets.offset_for("yolo-seg"), 2);
        assert_eq!(offsets.offset_for("other"), 0);

        assert_eq!(ClassOffsets::parse("").unwrap(), ClassOffsets::empty());
        assert!(ClassOffsets::parse("maskrcnn-training").is_err());
        assert!(ClassOffsets::parse("x=-1").is_err());
        assert!(ClassOffsets::parse("=1").is_err());
    }
}
