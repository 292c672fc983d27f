//! Correlation payload
//!
//! Embedded verbatim into an assembly's `fields.attacher` so a later webhook
//! or poll can reload the exact record/attachment context without any
//! server-side session state. The payload is opaque to the transcoding
//! service and is re-validated on return: the record must still exist and
//! the attachment must be unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of the local record and attachment a submitted assembly
/// belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPayload {
    /// Record type name (e.g. "Photo")
    pub record_class: String,
    /// Record primary key, stringified
    pub record_id: String,
    /// Name of the attachment field on the record
    pub name: String,
    /// The cached (pre-processing) uploaded file descriptor
    pub data: Value,
}
