//! Assembly spec and builder
//!
//! The builder turns one pipeline, a named map of derivative "version"
//! pipelines, or a raw template id into a submittable assembly spec. It
//! enforces the build-time invariants: every pipeline must be imported,
//! unexported pipelines get a synthesized export step, and merged step
//! names must be globally unique.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::correlation::CorrelationPayload;
use crate::error::Error;
use crate::pipeline::TranscodePipeline;
use crate::step::Step;
use crate::storage::StorageDescriptor;

/// Destination path pattern for synthesized export steps
///
/// `${unique_prefix}` avoids collisions between outputs of different
/// assemblies; the name/extension placeholders keep the source filename.
pub const DEFAULT_EXPORT_PATH: &str = "${unique_prefix}/${file.name}.${file.ext}";

/// A submittable processing job description
///
/// Ephemeral: built per request, handed to the client for submission, then
/// dropped. The correlation payload inside `fields` is the only part that
/// outlives the request, echoed back by the service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblySpec {
    pub steps: Vec<Step>,
    pub fields: Map<String, Value>,
    pub template_id: Option<String>,
    pub notify_url: Option<String>,
}

impl AssemblySpec {
    /// Steps in the service's wire shape, keyed by step name
    pub fn steps_by_name(&self) -> Map<String, Value> {
        let mut steps = Map::new();
        for step in &self.steps {
            steps.insert(step.name.clone(), Value::Object(step.wire_definition()));
        }
        steps
    }
}

/// What an assembly is built from
#[derive(Debug, Clone)]
pub enum AssemblySource {
    /// A single pipeline for one logical file
    File(TranscodePipeline),
    /// Named derivative pipelines, merged into one assembly
    Versions(BTreeMap<String, TranscodePipeline>),
    /// A template registered on the service side; no step synthesis
    Template(String),
}

/// Builds assembly specs against a destination storage
///
/// Pure transform: no network calls happen here.
#[derive(Debug, Clone)]
pub struct AssemblyBuilder {
    storage: StorageDescriptor,
    notify_url: Option<String>,
    correlation: Option<CorrelationPayload>,
    extra_steps: Vec<Step>,
    extra_fields: Map<String, Value>,
}

impl AssemblyBuilder {
    /// Creates a builder exporting to the given storage
    pub fn new(storage: StorageDescriptor) -> Self {
        Self {
            storage,
            notify_url: None,
            correlation: None,
            extra_steps: Vec::new(),
            extra_fields: Map::new(),
        }
    }

    /// Sets the webhook URL the service notifies on completion
    pub fn notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = Some(url.into());
        self
    }

    /// Embeds the correlation payload under `fields.attacher`
    pub fn correlation(mut self, payload: CorrelationPayload) -> Self {
        self.correlation = Some(payload);
        self
    }

    /// Adds a caller-supplied step, merged after the pipeline steps
    pub fn extra_step(mut self, step: Step) -> Self {
        self.extra_steps.push(step);
        self
    }

    /// Adds a caller-supplied field, never overriding built entries
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_fields.insert(key.into(), value.into());
        self
    }

    /// Assembles the spec, validating pipeline invariants
    pub fn build(self, source: AssemblySource) -> Result<AssemblySpec, Error> {
        let mut steps: Vec<Step> = Vec::new();
        let mut fields = Map::new();
        let mut template_id = None;

        match source {
            AssemblySource::Template(id) => template_id = Some(id),
            AssemblySource::File(pipeline) => {
                let finalized = self.finalize(&pipeline, "export")?;
                if let Some(result_name) = finalized.result_name() {
                    fields.insert("result_name".to_string(), Value::String(result_name.into()));
                }
                fields.insert(
                    "multiple".to_string(),
                    Value::String(pipeline.multiple().as_str().to_string()),
                );
                merge_steps(&mut steps, finalized.steps())?;
            }
            AssemblySource::Versions(pipelines) => {
                let mut versions = Map::new();
                let mut multiple = Map::new();
                for (version, pipeline) in &pipelines {
                    let finalized = self.finalize(pipeline, &format!("export_{version}"))?;
                    if let Some(result_name) = finalized.result_name() {
                        versions.insert(version.clone(), Value::String(result_name.into()));
                    }
                    multiple.insert(
                        version.clone(),
                        Value::String(pipeline.multiple().as_str().to_string()),
                    );
                    merge_steps(&mut steps, finalized.steps())?;
                }
                fields.insert("versions".to_string(), Value::Object(versions));
                fields.insert("multiple".to_string(), Value::Object(multiple));
            }
        }

        merge_steps(&mut steps, &self.extra_steps)?;

        if let Some(payload) = &self.correlation {
            fields.insert(
                "attacher".to_string(),
                json!({
                    "record_class": payload.record_class,
                    "record_id": payload.record_id,
                    "name": payload.name,
                    "data": payload.data,
                }),
            );
        }
        for (key, value) in self.extra_fields {
            fields.entry(key).or_insert(value);
        }

        Ok(AssemblySpec {
            steps,
            fields,
            template_id,
            notify_url: self.notify_url,
        })
    }

    /// Validates one pipeline and appends an export step when missing
    fn finalize(
        &self,
        pipeline: &TranscodePipeline,
        export_name: &str,
    ) -> Result<TranscodePipeline, Error> {
        if pipeline.steps().is_empty() {
            return Err(Error::EmptyPipeline);
        }
        if !pipeline.imported() {
            return Err(Error::MissingImportStep);
        }
        if pipeline.exported() {
            return Ok(pipeline.clone());
        }

        let last_name = pipeline
            .steps()
            .last()
            .map(|step| step.name.clone())
            .unwrap_or_default();
        let export = self
            .storage
            .export_step(export_name, DEFAULT_EXPORT_PATH)?
            .with_use(vec![last_name]);
        Ok(pipeline.add_step(export))
    }
}

/// Appends steps, deduplicating identical definitions by name
///
/// The same name with a differing definition is a contract violation.
fn merge_steps(merged: &mut Vec<Step>, incoming: &[Step]) -> Result<(), Error> {
    for step in incoming {
        match merged.iter().find(|existing| existing.name == step.name) {
            Some(existing) if existing == step => {}
            Some(_) => return Err(Error::DuplicateStep(step.name.clone())),
            None => merged.push(step.clone()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Multiplicity;
    use serde_json::Map as JsonMap;

    fn store() -> StorageDescriptor {
        StorageDescriptor::ObjectStore {
            name: "store".to_string(),
            bucket: "bucket".to_string(),
            region: "us-east-1".to_string(),
            access_key: "key".to_string(),
            secret_key: "secret".to_string(),
            prefix: None,
        }
    }

    fn imported() -> TranscodePipeline {
        TranscodePipeline::new().add_named_step("import", "/http/import", JsonMap::new())
    }

    #[test]
    fn test_adds_export_step_when_missing() {
        let spec = AssemblyBuilder::new(store())
            .build(AssemblySource::File(imported()))
            .unwrap();

        assert_eq!(spec.steps.len(), 2);
        let export = spec.steps.last().unwrap();
        assert_eq!(export.name, "export");
        assert_eq!(export.robot, "/s3/store");
        assert_eq!(export.use_steps, vec!["import".to_string()]);
        assert!(
            export.options["path"]
                .as_str()
                .unwrap()
                .contains("${file.ext}")
        );
    }

    #[test]
    fn test_does_not_add_second_export_step() {
        let pipeline = imported().add_named_step("my_export", "/s3/store", JsonMap::new());
        let spec = AssemblyBuilder::new(store())
            .build(AssemblySource::File(pipeline))
            .unwrap();

        assert_eq!(spec.steps.len(), 2);
        assert_eq!(spec.steps.last().unwrap().name, "my_export");
    }

    #[test]
    fn test_version_export_steps_are_suffixed() {
        let mut versions = BTreeMap::new();
        versions.insert("thumb".to_string(), imported());

        let spec = AssemblyBuilder::new(store())
            .build(AssemblySource::Versions(versions))
            .unwrap();

        assert_eq!(spec.steps.last().unwrap().name, "export_thumb");
        assert_eq!(spec.fields["versions"]["thumb"], "import");
        assert_eq!(spec.fields["multiple"]["thumb"], "single");
    }

    #[test]
    fn test_records_result_name_and_multiplicity() {
        let pipeline = imported()
            .add_named_step("resize", "/image/resize", JsonMap::new())
            .with_multiple(Multiplicity::List);
        let spec = AssemblyBuilder::new(store())
            .build(AssemblySource::File(pipeline))
            .unwrap();

        assert_eq!(spec.fields["result_name"], "resize");
        assert_eq!(spec.fields["multiple"], "list");
    }

    #[test]
    fn test_duplicate_steps_with_identical_definitions_dedup() {
        let shared = Step::new("import", "/http/import").with_option("url", "http://example.com");
        let mut versions = BTreeMap::new();
        versions.insert(
            "a".to_string(),
            TranscodePipeline::new()
                .add_step(shared.clone())
                .add_named_step("resize_a", "/image/resize", JsonMap::new()),
        );
        versions.insert(
            "b".to_string(),
            TranscodePipeline::new()
                .add_step(shared)
                .add_named_step("resize_b", "/image/resize", JsonMap::new()),
        );

        let spec = AssemblyBuilder::new(store())
            .build(AssemblySource::Versions(versions))
            .unwrap();

        let imports = spec.steps.iter().filter(|s| s.name == "import").count();
        assert_eq!(imports, 1);
    }

    #[test]
    fn test_duplicate_steps_with_conflicting_definitions_fail() {
        let mut versions = BTreeMap::new();
        versions.insert(
            "a".to_string(),
            TranscodePipeline::new()
                .add_step(Step::new("import", "/s3/import").with_option("foo", "foo")),
        );
        versions.insert(
            "b".to_string(),
            TranscodePipeline::new()
                .add_step(Step::new("import", "/s3/import").with_option("bar", "bar")),
        );

        let result = AssemblyBuilder::new(store()).build(AssemblySource::Versions(versions));
        assert!(matches!(result, Err(Error::DuplicateStep(name)) if name == "import"));
    }

    #[test]
    fn test_empty_pipeline_fails() {
        let result =
            AssemblyBuilder::new(store()).build(AssemblySource::File(TranscodePipeline::new()));
        assert!(matches!(result, Err(Error::EmptyPipeline)));
    }

    #[test]
    fn test_missing_import_step_fails() {
        let pipeline = TranscodePipeline::new()
            .add_named_step("resize", "/image/resize", JsonMap::new())
            .add_named_step("export", "/s3/store", JsonMap::new());

        let result = AssemblyBuilder::new(store()).build(AssemblySource::File(pipeline));
        assert!(matches!(result, Err(Error::MissingImportStep)));
    }

    #[test]
    fn test_template_source_sets_template_id_only() {
        let spec = AssemblyBuilder::new(store())
            .build(AssemblySource::Template("my_template".to_string()))
            .unwrap();

        assert_eq!(spec.template_id.as_deref(), Some("my_template"));
        assert!(spec.steps.is_empty());
    }

    #[test]
    fn test_extra_steps_and_fields_do_not_override() {
        let spec = AssemblyBuilder::new(store())
            .extra_step(Step::new("watermark", "/image/resize"))
            .field("foo", "bar")
            .field("multiple", "overridden")
            .build(AssemblySource::File(imported()))
            .unwrap();

        assert!(spec.steps.iter().any(|s| s.name == "watermark"));
        assert!(spec.steps.iter().any(|s| s.name == "import"));
        assert_eq!(spec.fields["foo"], "bar");
        // built entry wins over the caller-supplied one
        assert_eq!(spec.fields["multiple"], "single");
    }

    #[test]
    fn test_correlation_payload_is_embedded() {
        let spec = AssemblyBuilder::new(store())
            .correlation(CorrelationPayload {
                record_class: "Photo".to_string(),
                record_id: "7".to_string(),
                name: "image".to_string(),
                data: json!({"id": "cached.jpg"}),
            })
            .notify_url("https://example.com/webhooks/transloadit")
            .build(AssemblySource::File(imported()))
            .unwrap();

        assert_eq!(spec.fields["attacher"]["record_class"], "Photo");
        assert_eq!(spec.fields["attacher"]["record_id"], "7");
        assert_eq!(
            spec.notify_url.as_deref(),
            Some("https://example.com/webhooks/transloadit")
        );
    }

    #[test]
    fn test_steps_by_name_wire_shape() {
        let spec = AssemblyBuilder::new(store())
            .build(AssemblySource::File(imported()))
            .unwrap();

        let steps = spec.steps_by_name();
        assert_eq!(steps["import"]["robot"], "/http/import");
        assert_eq!(steps["export"]["robot"], "/s3/store");
        assert_eq!(steps["export"]["use"], json!(["import"]));
    }
}
