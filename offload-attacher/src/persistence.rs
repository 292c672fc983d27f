//! Persistence collaborator traits
//!
//! The persisted record is the only shared mutable resource in the system.
//! It is mutated exclusively through [`RecordStore::compare_and_swap`]:
//! "swap if the current value still equals the expected prior value". The
//! expected-and-common conflict path is an ordinary result variant, not an
//! exception.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use offload_core::CorrelationPayload;

/// Snapshot of one record's attachment slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub record_class: String,
    pub record_id: String,
    /// Name of the attachment field
    pub name: String,
    /// The field's current stored value, if any
    pub current: Option<Value>,
}

/// Result of an optimistic attachment swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The stored value matched the expected prior value and was replaced
    Swapped,
    /// The stored value changed since it was read; nothing was written
    Conflict,
    /// The record no longer exists
    Missing,
}

/// Read/swap access to persisted records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Loads the attachment slot the payload points at
    ///
    /// `Ok(None)` when the record no longer exists.
    async fn load(&self, payload: &CorrelationPayload) -> anyhow::Result<Option<AttachmentRecord>>;

    /// Atomically replaces the attachment value if it still equals
    /// `expected`
    async fn compare_and_swap(
        &self,
        payload: &CorrelationPayload,
        expected: &Value,
        new: &Value,
    ) -> anyhow::Result<CasOutcome>;
}

/// A batch of remote outputs scheduled for deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupTask {
    pub id: Uuid,
    /// URLs of the orphaned remote objects
    pub urls: Vec<String>,
}

impl CleanupTask {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            urls,
        }
    }
}

/// Fire-and-forget background deletion of remote outputs
#[async_trait]
pub trait CleanupQueue: Send + Sync {
    async fn enqueue(&self, task: CleanupTask) -> anyhow::Result<()>;
}
