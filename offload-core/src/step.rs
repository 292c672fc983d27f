//! Processing step type
//!
//! A step is one named operation inside an assembly: an import, a transform,
//! or an export. The service identifies the operation kind by its "robot"
//! name (e.g. `/image/resize`, `/s3/import`, `/s3/store`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Robots whose name ends with this suffix bring files into an assembly.
pub const IMPORT_ROBOT_SUFFIX: &str = "/import";

/// Robots whose name ends with this suffix persist assembly outputs.
pub const EXPORT_ROBOT_SUFFIX: &str = "/store";

/// One named processing operation within an assembly
///
/// `use_steps` lists the names of the steps whose outputs this step consumes.
/// An empty list means the step takes the assembly's original input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub robot: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    #[serde(rename = "use", default, skip_serializing_if = "Vec::is_empty")]
    pub use_steps: Vec<String>,
}

impl Step {
    /// Creates a step with no options and no dependencies
    pub fn new(name: impl Into<String>, robot: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            robot: robot.into(),
            options: Map::new(),
            use_steps: Vec::new(),
        }
    }

    /// Adds a single option, consuming and returning the step
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Sets the steps this step consumes as input
    pub fn with_use(mut self, names: Vec<String>) -> Self {
        self.use_steps = names;
        self
    }

    /// Whether this step's robot belongs to the import family
    pub fn is_import(&self) -> bool {
        self.robot.ends_with(IMPORT_ROBOT_SUFFIX)
    }

    /// Whether this step's robot belongs to the export family
    pub fn is_export(&self) -> bool {
        self.robot.ends_with(EXPORT_ROBOT_SUFFIX)
    }

    /// The step's definition in the service's wire shape:
    /// `{ "robot": ..., "use": [...], ...options }`
    pub fn wire_definition(&self) -> Map<String, Value> {
        let mut definition = Map::new();
        definition.insert("robot".to_string(), Value::String(self.robot.clone()));
        if !self.use_steps.is_empty() {
            definition.insert(
                "use".to_string(),
                Value::Array(
                    self.use_steps
                        .iter()
                        .map(|name| Value::String(name.clone()))
                        .collect(),
                ),
            );
        }
        for (key, value) in &self.options {
            definition.insert(key.clone(), value.clone());
        }
        definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robot_families() {
        assert!(Step::new("import", "/s3/import").is_import());
        assert!(Step::new("import", "/http/import").is_import());
        assert!(!Step::new("resize", "/image/resize").is_import());

        assert!(Step::new("export", "/s3/store").is_export());
        assert!(Step::new("export", "/google/store").is_export());
        assert!(!Step::new("resize", "/image/resize").is_export());
    }

    #[test]
    fn test_wire_definition() {
        let step = Step::new("resize", "/image/resize")
            .with_option("width", 300)
            .with_use(vec!["import".to_string()]);

        let definition = step.wire_definition();
        assert_eq!(definition["robot"], "/image/resize");
        assert_eq!(definition["width"], 300);
        assert_eq!(definition["use"], serde_json::json!(["import"]));
    }

    #[test]
    fn test_wire_definition_omits_empty_use() {
        let definition = Step::new("import", "/http/import").wire_definition();
        assert!(!definition.contains_key("use"));
    }
}
