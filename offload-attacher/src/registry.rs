//! Processor and saver registry
//!
//! A capability table per uploader type: processors build assembly specs
//! for an attachment, savers turn a finished assembly into the value to
//! persist. Registration is explicit and lookup of an unregistered name is
//! an error, never silent fallthrough.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use offload_core::{AssemblySpec, AssemblyStatus, CorrelationPayload, StorageDescriptor, UploadedFileRef};

use crate::error::AttachError;

/// Everything a processor needs to describe one attachment's processing
#[derive(Debug, Clone)]
pub struct ProcessContext {
    /// The cached (pre-processing) uploaded file
    pub file: UploadedFileRef,
    /// Storage the cached file lives in; drives the import step
    pub cache: StorageDescriptor,
    /// Storage results are exported to
    pub store: StorageDescriptor,
    /// Identity round-tripped through the service
    pub correlation: CorrelationPayload,
    /// Webhook URL, when completion notifications are reachable
    pub notify_url: Option<String>,
}

/// Builds an assembly spec for an attachment
pub type ProcessorFn = Arc<dyn Fn(&ProcessContext) -> Result<AssemblySpec, AttachError> + Send + Sync>;

/// Maps a finished assembly onto the attachment value to persist
pub type SaverFn = Arc<dyn Fn(&AssemblyStatus) -> Result<Value, AttachError> + Send + Sync>;

/// Named processors and savers for one uploader type
#[derive(Default, Clone)]
pub struct ProcessorRegistry {
    processors: HashMap<String, ProcessorFn>,
    savers: HashMap<String, SaverFn>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a processor under the given name, replacing any previous one
    pub fn register_processor(&mut self, name: impl Into<String>, processor: ProcessorFn) {
        self.processors.insert(name.into(), processor);
    }

    /// Registers a saver under the given name, replacing any previous one
    pub fn register_saver(&mut self, name: impl Into<String>, saver: SaverFn) {
        self.savers.insert(name.into(), saver);
    }

    /// Looks up a processor, erroring on unregistered names
    pub fn processor(&self, name: &str) -> Result<ProcessorFn, AttachError> {
        self.processors
            .get(name)
            .cloned()
            .ok_or_else(|| AttachError::ProcessorNotRegistered(name.to_string()))
    }

    /// Looks up a saver, erroring on unregistered names
    pub fn saver(&self, name: &str) -> Result<SaverFn, AttachError> {
        self.savers
            .get(name)
            .cloned()
            .ok_or_else(|| AttachError::SaverNotRegistered(name.to_string()))
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("processors", &self.processors.keys().collect::<Vec<_>>())
            .field("savers", &self.savers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_lookup_or_error() {
        let mut registry = ProcessorRegistry::new();
        registry.register_processor(
            "thumbnails",
            Arc::new(|_ctx| Ok(AssemblySpec::default())),
        );

        assert!(registry.processor("thumbnails").is_ok());
        assert!(matches!(
            registry.processor("missing"),
            Err(AttachError::ProcessorNotRegistered(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_saver_lookup_or_error() {
        let mut registry = ProcessorRegistry::new();
        registry.register_saver("thumbnails", Arc::new(|_status| Ok(Value::Null)));

        assert!(registry.saver("thumbnails").is_ok());
        assert!(matches!(
            registry.saver("missing"),
            Err(AttachError::SaverNotRegistered(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_registration_replaces_previous() {
        let mut registry = ProcessorRegistry::new();
        registry.register_saver("v", Arc::new(|_| Ok(Value::from(1))));
        registry.register_saver("v", Arc::new(|_| Ok(Value::from(2))));

        let saver = registry.saver("v").unwrap();
        assert_eq!(saver(&AssemblyStatus::default()).unwrap(), Value::from(2));
    }
}
