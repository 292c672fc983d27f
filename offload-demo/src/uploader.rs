//! Photo uploader
//!
//! Registers the processors the demo's photos use. The only one so far is
//! `thumbnails`, which derives three resized versions from the cached
//! upload in a single assembly.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Map;

use offload_attacher::{AttachError, ProcessContext, ProcessorRegistry};
use offload_core::{AssemblyBuilder, AssemblySource, AssemblySpec, TranscodePipeline};

/// Version name and square bounding size, smallest first
const SIZES: [(&str, u64); 3] = [("small", 300), ("medium", 500), ("large", 800)];

/// Builds the registry the demo app runs with
pub fn build_registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register_processor("thumbnails", Arc::new(thumbnails));
    registry
}

/// Derives small/medium/large resized versions from the cached upload
fn thumbnails(ctx: &ProcessContext) -> Result<AssemblySpec, AttachError> {
    let import = ctx.cache.import_step("import", &ctx.file)?;

    let mut versions = BTreeMap::new();
    for (name, size) in SIZES {
        let mut options = Map::new();
        options.insert("width".to_string(), size.into());
        options.insert("height".to_string(), size.into());

        let pipeline = TranscodePipeline::new()
            .add_step(import.clone())
            .add_named_step(format!("resize_{size}"), "/image/resize", options);
        versions.insert(name.to_string(), pipeline);
    }

    let mut builder = AssemblyBuilder::new(ctx.store.clone()).correlation(ctx.correlation.clone());
    if let Some(url) = &ctx.notify_url {
        builder = builder.notify_url(url.clone());
    }

    Ok(builder.build(AssemblySource::Versions(versions))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use offload_core::{CorrelationPayload, StorageDescriptor, UploadedFileRef};

    fn context() -> ProcessContext {
        ProcessContext {
            file: UploadedFileRef {
                id: "https://uploads.example/raw/cached.jpg".to_string(),
                storage: "cache".to_string(),
                metadata: Map::new(),
            },
            cache: StorageDescriptor::UrlStore {
                name: "cache".to_string(),
            },
            store: StorageDescriptor::ObjectStore {
                name: "store".to_string(),
                bucket: "bucket".to_string(),
                region: "us-east-1".to_string(),
                access_key: "key".to_string(),
                secret_key: "secret".to_string(),
                prefix: Some("store".to_string()),
            },
            correlation: CorrelationPayload {
                record_class: "Photo".to_string(),
                record_id: "7".to_string(),
                name: "image".to_string(),
                data: json!({"id": "raw/cached.jpg", "storage": "cache"}),
            },
            notify_url: Some("https://demo.example/webhooks/transloadit".to_string()),
        }
    }

    #[test]
    fn test_thumbnails_builds_three_versions_sharing_one_import() {
        let spec = thumbnails(&context()).unwrap();
        let names: Vec<&str> = spec.steps.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "import",
                "resize_800",
                "export_large",
                "resize_500",
                "export_medium",
                "resize_300",
                "export_small",
            ]
        );
        assert_eq!(spec.notify_url.as_deref(), Some("https://demo.example/webhooks/transloadit"));
        assert_eq!(spec.fields["versions"]["small"], "resize_300");
        assert_eq!(spec.fields["multiple"]["small"], "single");
        assert_eq!(spec.fields["attacher"]["record_id"], "7");
    }

    #[test]
    fn test_resize_steps_chain_off_the_import() {
        let spec = thumbnails(&context()).unwrap();
        let resize = spec
            .steps
            .iter()
            .find(|s| s.name == "resize_300")
            .unwrap();

        assert_eq!(resize.robot, "/image/resize");
        assert_eq!(resize.use_steps, vec!["import".to_string()]);
        assert_eq!(resize.options["width"], 300);
    }
}
