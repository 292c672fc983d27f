//! Assembly status and result types
//!
//! The shape the transcoding service reports back, both from polling an
//! assembly URL and inside webhook notification payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::correlation::CorrelationPayload;

/// `ok` code the service reports once an assembly has fully completed
pub const ASSEMBLY_COMPLETED: &str = "ASSEMBLY_COMPLETED";

/// One output object produced by one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDescriptor {
    pub url: String,
    pub name: String,
    pub size: u64,
    pub mime: String,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// Status envelope for one submitted assembly
///
/// Created on submit, then only ever replaced by re-fetching; terminal once
/// `finished()` returns true. Unknown envelope fields are ignored on
/// deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyStatus {
    #[serde(default)]
    pub assembly_id: String,
    /// URL to re-fetch this assembly's status from
    #[serde(default)]
    pub assembly_url: String,
    /// Progress/completion code (e.g. "ASSEMBLY_COMPLETED")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<String>,
    /// Error code if the assembly failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable detail accompanying `ok` or `error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
    /// Arbitrary fields echoed back verbatim, including the correlation
    /// payload under "attacher"
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Outputs keyed by step name
    #[serde(default)]
    pub results: HashMap<String, Vec<ResultDescriptor>>,
}

impl AssemblyStatus {
    /// Whether the assembly reached a terminal state (completed or errored)
    pub fn finished(&self) -> bool {
        self.errored() || self.ok.as_deref() == Some(ASSEMBLY_COMPLETED)
    }

    /// Whether the service reported a failure for this assembly
    pub fn errored(&self) -> bool {
        self.error.is_some()
    }

    /// Decodes the correlation payload echoed back under `fields.attacher`
    ///
    /// `Ok(None)` when the assembly was submitted without one.
    pub fn correlation(&self) -> Result<Option<CorrelationPayload>, serde_json::Error> {
        match self.fields.get("attacher") {
            Some(value) => serde_json::from_value(value.clone()).map(Some),
            None => Ok(None),
        }
    }
}
