//! Transcode pipeline
//!
//! An ordered chain of steps describing one logical file's processing path.
//! Pipelines are immutable value types: every mutating operation returns a
//! new instance and leaves the receiver untouched, so a partially built
//! pipeline can be shared and extended in multiple directions safely.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::step::Step;

/// Declared expectation of how many output files a pipeline yields
///
/// Checked against the actual result cardinality at reconciliation time;
/// a mismatch is a contract violation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    /// Exactly one output file
    #[default]
    Single,
    /// Zero or more output files
    List,
}

impl Multiplicity {
    /// Wire name, as recorded in assembly fields
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::List => "list",
        }
    }

    /// Parses a declaration from an echoed assembly field
    ///
    /// Anything other than an explicit "list" falls back to the default.
    pub fn from_field(value: Option<&serde_json::Value>) -> Self {
        match value.and_then(serde_json::Value::as_str) {
            Some("list") => Self::List,
            _ => Self::Single,
        }
    }
}

/// An immutable chain of processing steps for one logical file
#[derive(Debug, Clone, Default)]
pub struct TranscodePipeline {
    steps: Vec<Step>,
    multiple: Multiplicity,
}

impl TranscodePipeline {
    /// Creates an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// The steps in this pipeline, in chain order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns a new pipeline with the given step appended as-is
    ///
    /// The step's `use` list is kept untouched; use [`add_named_step`]
    /// for sequential default-chaining.
    ///
    /// [`add_named_step`]: TranscodePipeline::add_named_step
    pub fn add_step(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self {
            steps,
            multiple: self.multiple,
        }
    }

    /// Returns a new pipeline with a step built from raw arguments
    ///
    /// The new step automatically consumes the output of the immediately
    /// preceding step in this chain (sequential default-chaining). The first
    /// step of a chain gets no dependency.
    pub fn add_named_step(
        &self,
        name: impl Into<String>,
        robot: impl Into<String>,
        options: Map<String, Value>,
    ) -> Self {
        let mut step = Step::new(name, robot);
        step.options = options;
        if let Some(previous) = self.steps.last() {
            step.use_steps = vec![previous.name.clone()];
        }
        self.add_step(step)
    }

    /// Declared output multiplicity
    pub fn multiple(&self) -> Multiplicity {
        self.multiple
    }

    /// Returns a new pipeline with the given multiplicity declared
    pub fn with_multiple(&self, multiple: Multiplicity) -> Self {
        Self {
            steps: self.steps.clone(),
            multiple,
        }
    }

    /// Whether the pipeline starts with an import step
    pub fn imported(&self) -> bool {
        self.steps.first().is_some_and(Step::is_import)
    }

    /// Whether the pipeline ends with an export step
    pub fn exported(&self) -> bool {
        self.steps.last().is_some_and(Step::is_export)
    }

    /// The step name under which this pipeline's output appears in the
    /// assembly results
    ///
    /// The last non-export step if the pipeline is exported, otherwise the
    /// last step. `None` for an empty pipeline.
    pub fn result_name(&self) -> Option<&str> {
        if self.exported() {
            self.steps
                .iter()
                .rev()
                .find(|step| !step.is_export())
                .map(|step| step.name.as_str())
        } else {
            self.steps.last().map(|step| step.name.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imported_pipeline() -> TranscodePipeline {
        TranscodePipeline::new().add_named_step("import", "/http/import", Map::new())
    }

    #[test]
    fn test_add_step_returns_new_instance() {
        let pipeline = TranscodePipeline::new();
        let extended = pipeline.add_named_step("import", "/http/import", Map::new());

        assert_eq!(pipeline.steps().len(), 0);
        assert_eq!(extended.steps().len(), 1);
    }

    #[test]
    fn test_add_step_keeps_receiver_unchanged() {
        let base = imported_pipeline();
        let extended = base.add_named_step("resize", "/image/resize", Map::new());

        assert_eq!(base.steps().len(), 1);
        assert_eq!(extended.steps().len(), base.steps().len() + 1);
        assert_eq!(base.steps()[0].name, "import");
    }

    #[test]
    fn test_default_chaining_uses_previous_step() {
        let pipeline = imported_pipeline().add_named_step("export", "/http/store", Map::new());

        assert!(pipeline.steps()[0].use_steps.is_empty());
        assert_eq!(pipeline.steps()[1].use_steps, vec!["import".to_string()]);
    }

    #[test]
    fn test_add_step_keeps_explicit_use() {
        let step = Step::new("export", "/s3/store").with_use(vec!["resize".to_string()]);
        let pipeline = imported_pipeline().add_step(step);

        assert_eq!(pipeline.steps()[1].use_steps, vec!["resize".to_string()]);
    }

    #[test]
    fn test_imported_and_exported() {
        let pipeline = imported_pipeline();
        assert!(pipeline.imported());
        assert!(!pipeline.exported());

        let pipeline = pipeline.add_named_step("export", "/s3/store", Map::new());
        assert!(pipeline.exported());

        assert!(!TranscodePipeline::new().imported());
        assert!(!TranscodePipeline::new().exported());
    }

    #[test]
    fn test_result_name() {
        let pipeline = imported_pipeline();
        assert_eq!(pipeline.result_name(), Some("import"));

        let pipeline = pipeline.add_named_step("resize", "/image/resize", Map::new());
        assert_eq!(pipeline.result_name(), Some("resize"));

        let pipeline = pipeline.add_named_step("export", "/s3/store", Map::new());
        assert_eq!(pipeline.result_name(), Some("resize"));

        assert_eq!(TranscodePipeline::new().result_name(), None);
    }

    #[test]
    fn test_multiplicity_field_round_trip() {
        let list = Value::String("list".to_string());
        assert_eq!(Multiplicity::from_field(Some(&list)), Multiplicity::List);
        assert_eq!(Multiplicity::from_field(None), Multiplicity::Single);
        assert_eq!(Multiplicity::List.as_str(), "list");
    }

    #[test]
    fn test_with_multiple() {
        let pipeline = imported_pipeline();
        assert_eq!(pipeline.multiple(), Multiplicity::Single);

        let listed = pipeline.with_multiple(Multiplicity::List);
        assert_eq!(listed.multiple(), Multiplicity::List);
        assert_eq!(pipeline.multiple(), Multiplicity::Single);
    }
}
