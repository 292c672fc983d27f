//! Result reconciliation
//!
//! Applies a finished assembly's results back onto the persisted record,
//! subject to staleness checks. The attachment slot moves through
//! `Cached -> Processing -> { Stored | Abandoned }`; terminal states are
//! never left again, and the store's compare-and-swap is the sole ordering
//! primitive preventing double-application when a poll races a webhook.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{info, warn};

use offload_core::{
    AssemblyStatus, CorrelationPayload, Multiplicity, ResultDescriptor, StorageDescriptor,
    UploadedFileRef,
};

use crate::error::AttachError;
use crate::persistence::{CasOutcome, CleanupQueue, CleanupTask, RecordStore};
use crate::registry::ProcessorRegistry;

/// How one finished assembly was resolved locally
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// The record was still pointing at the cached file; the new
    /// reference(s) were swapped in
    Stored(ReconciledFiles),
    /// The attachment moved on while processing ran (or a concurrent swap
    /// won); the new outputs were scheduled for deletion
    Abandoned,
    /// The record itself no longer exists; outputs scheduled for deletion
    OrphanDeleted,
}

/// Uploaded file references built from one assembly, honoring the declared
/// multiplicity of each pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciledFiles {
    Single(UploadedFileRef),
    Many(Vec<UploadedFileRef>),
    /// One entry per derivative version
    Versions(BTreeMap<String, ReconciledFiles>),
    /// Uploader-defined attachment value produced by a saver
    Custom(Value),
}

impl ReconciledFiles {
    /// The value persisted into the attachment field
    pub fn to_value(&self) -> Value {
        match self {
            Self::Single(file) => file_value(file),
            Self::Many(files) => Value::Array(files.iter().map(file_value).collect()),
            Self::Versions(versions) => Value::Object(
                versions
                    .iter()
                    .map(|(name, files)| (name.clone(), files.to_value()))
                    .collect(),
            ),
            Self::Custom(value) => value.clone(),
        }
    }
}

fn file_value(file: &UploadedFileRef) -> Value {
    serde_json::json!({
        "id": file.id,
        "storage": file.storage,
        "metadata": file.metadata,
    })
}

/// Reconciles finished assemblies against persisted records
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Storage the assembly exported into; drives result URL mapping
    storage: StorageDescriptor,
}

impl Reconciler {
    pub fn new(storage: StorageDescriptor) -> Self {
        Self { storage }
    }

    /// Applies one finished assembly to its record
    ///
    /// The assembly's own error field short-circuits everything else;
    /// staleness and missing records resolve to cleanup outcomes rather
    /// than errors.
    pub async fn reconcile(
        &self,
        status: &AssemblyStatus,
        store: &dyn RecordStore,
        cleanup: &dyn CleanupQueue,
    ) -> Result<ReconcileOutcome, AttachError> {
        self.apply(status, store, cleanup, |status| self.map_results(status))
            .await
    }

    /// Applies one finished template assembly through a registered saver
    ///
    /// Template submissions carry none of the local result-mapping fields,
    /// so the attachment value comes from the uploader's saver instead of
    /// the generic mapping. Staleness and cleanup behave exactly as in
    /// [`reconcile`](Reconciler::reconcile).
    pub async fn reconcile_with_saver(
        &self,
        status: &AssemblyStatus,
        registry: &ProcessorRegistry,
        saver_name: &str,
        store: &dyn RecordStore,
        cleanup: &dyn CleanupQueue,
    ) -> Result<ReconcileOutcome, AttachError> {
        let saver = registry.saver(saver_name)?;
        self.apply(status, store, cleanup, |status| {
            Ok(ReconciledFiles::Custom(saver(status)?))
        })
        .await
    }

    async fn apply(
        &self,
        status: &AssemblyStatus,
        store: &dyn RecordStore,
        cleanup: &dyn CleanupQueue,
        build: impl FnOnce(&AssemblyStatus) -> Result<ReconciledFiles, AttachError>,
    ) -> Result<ReconcileOutcome, AttachError> {
        if let Some(code) = &status.error {
            return Err(AttachError::Response {
                code: code.clone(),
                message: status.message.clone().unwrap_or_default(),
                assembly_url: status.assembly_url.clone(),
            });
        }

        let payload = status
            .correlation()?
            .ok_or_else(|| AttachError::MalformedEnvelope("missing fields.attacher".to_string()))?;

        let record = store
            .load(&payload)
            .await
            .map_err(AttachError::Store)?;
        let Some(record) = record else {
            info!(
                record_class = %payload.record_class,
                record_id = %payload.record_id,
                "record no longer exists, deleting assembly outputs"
            );
            self.schedule_cleanup(status, cleanup).await?;
            return Ok(ReconcileOutcome::OrphanDeleted);
        };

        // the cached reference must still be what the record points at
        if record.current.as_ref() != Some(&payload.data) {
            self.abandon(status, &payload, cleanup).await?;
            return Ok(ReconcileOutcome::Abandoned);
        }

        let files = build(status)?;

        match store
            .compare_and_swap(&payload, &payload.data, &files.to_value())
            .await
            .map_err(AttachError::Store)?
        {
            CasOutcome::Swapped => {
                info!(
                    record_class = %payload.record_class,
                    record_id = %payload.record_id,
                    assembly_id = %status.assembly_id,
                    "stored assembly results"
                );
                Ok(ReconcileOutcome::Stored(files))
            }
            CasOutcome::Conflict => {
                self.abandon(status, &payload, cleanup).await?;
                Ok(ReconcileOutcome::Abandoned)
            }
            CasOutcome::Missing => {
                self.schedule_cleanup(status, cleanup).await?;
                Ok(ReconcileOutcome::OrphanDeleted)
            }
        }
    }

    /// Maps assembly results into file references per declared pipeline
    ///
    /// Declared multiplicity is enforced here: `single` accepts exactly one
    /// output, `list` accepts any number.
    pub fn map_results(&self, status: &AssemblyStatus) -> Result<ReconciledFiles, AttachError> {
        if let Some(Value::Object(versions)) = status.fields.get("versions") {
            let declared = status.fields.get("multiple").and_then(Value::as_object);
            let mut out = BTreeMap::new();
            for (version, result_name) in versions {
                let result_name = result_name.as_str().ok_or_else(|| {
                    AttachError::MalformedEnvelope(format!(
                        "fields.versions[{version:?}] is not a string"
                    ))
                })?;
                let multiple =
                    Multiplicity::from_field(declared.and_then(|map| map.get(version)));
                out.insert(
                    version.clone(),
                    self.collect(result_name, status.results.get(result_name), multiple)?,
                );
            }
            Ok(ReconciledFiles::Versions(out))
        } else {
            let result_name = status
                .fields
                .get("result_name")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    AttachError::MalformedEnvelope("missing fields.result_name".to_string())
                })?;
            let multiple = Multiplicity::from_field(status.fields.get("multiple"));
            self.collect(result_name, status.results.get(result_name), multiple)
        }
    }

    fn collect(
        &self,
        step: &str,
        descriptors: Option<&Vec<ResultDescriptor>>,
        multiple: Multiplicity,
    ) -> Result<ReconciledFiles, AttachError> {
        let empty = Vec::new();
        let descriptors = descriptors.unwrap_or(&empty);
        let files = descriptors
            .iter()
            .map(|descriptor| UploadedFileRef::from_result(descriptor, &self.storage))
            .collect::<Result<Vec<_>, _>>()?;

        match multiple {
            Multiplicity::List => Ok(ReconciledFiles::Many(files)),
            Multiplicity::Single => {
                let mut files = files;
                match files.len() {
                    1 => Ok(ReconciledFiles::Single(files.remove(0))),
                    0 => Err(AttachError::MissingResults {
                        step: step.to_string(),
                    }),
                    count => Err(AttachError::Multiplicity {
                        step: step.to_string(),
                        count,
                    }),
                }
            }
        }
    }

    async fn abandon(
        &self,
        status: &AssemblyStatus,
        payload: &CorrelationPayload,
        cleanup: &dyn CleanupQueue,
    ) -> Result<(), AttachError> {
        warn!(
            record_class = %payload.record_class,
            record_id = %payload.record_id,
            assembly_id = %status.assembly_id,
            "attachment changed while processing, abandoning assembly outputs"
        );
        self.schedule_cleanup(status, cleanup).await
    }

    async fn schedule_cleanup(
        &self,
        status: &AssemblyStatus,
        cleanup: &dyn CleanupQueue,
    ) -> Result<(), AttachError> {
        let urls = result_urls(&status.results);
        if urls.is_empty() {
            return Ok(());
        }
        cleanup
            .enqueue(CleanupTask::new(urls))
            .await
            .map_err(AttachError::Cleanup)
    }
}

fn result_urls(
    results: &std::collections::HashMap<String, Vec<ResultDescriptor>>,
) -> Vec<String> {
    let mut urls: Vec<String> = results
        .values()
        .flatten()
        .map(|descriptor| descriptor.url.clone())
        .collect();
    urls.sort();
    urls
}

/// Convenience for tests and demo code: the attachment value for a cached
/// file reference
pub fn attachment_value(file: &UploadedFileRef) -> Value {
    file_value(file)
}
