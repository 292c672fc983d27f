//! In-memory persistence for the demo
//!
//! A real deployment would back [`RecordStore`] with a database row and
//! [`CleanupQueue`] with a background job system; the demo keeps both in
//! process memory so it runs standalone.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use offload_attacher::{AttachmentRecord, CasOutcome, CleanupQueue, CleanupTask, RecordStore};
use offload_core::CorrelationPayload;

/// Record class embedded in correlation payloads
pub const RECORD_CLASS: &str = "Photo";

/// Attachment slot name on the photo record
pub const ATTACHMENT_NAME: &str = "image";

/// A photo with one attachment slot
#[derive(Debug, Clone, Serialize)]
pub struct Photo {
    pub id: String,
    pub title: String,
    /// The cached upload at first, the processed result(s) after
    /// reconciliation
    pub image: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Photo storage backed by an in-process map
#[derive(Debug, Default)]
pub struct InMemoryStore {
    photos: RwLock<HashMap<String, Photo>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists a new photo pointing at its cached upload
    pub async fn create(&self, title: String, image: Value) -> Photo {
        let photo = Photo {
            id: Uuid::new_v4().to_string(),
            title,
            image: Some(image),
            created_at: Utc::now(),
        };
        self.photos
            .write()
            .await
            .insert(photo.id.clone(), photo.clone());
        photo
    }

    pub async fn get(&self, id: &str) -> Option<Photo> {
        self.photos.read().await.get(id).cloned()
    }

    /// All photos, newest first
    pub async fn list(&self) -> Vec<Photo> {
        let mut photos: Vec<Photo> = self.photos.read().await.values().cloned().collect();
        photos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        photos
    }

    pub async fn delete(&self, id: &str) -> Option<Photo> {
        self.photos.write().await.remove(id)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn load(&self, payload: &CorrelationPayload) -> anyhow::Result<Option<AttachmentRecord>> {
        if payload.record_class != RECORD_CLASS || payload.name != ATTACHMENT_NAME {
            return Ok(None);
        }

        Ok(self.photos.read().await.get(&payload.record_id).map(|photo| {
            AttachmentRecord {
                record_class: RECORD_CLASS.to_string(),
                record_id: photo.id.clone(),
                name: ATTACHMENT_NAME.to_string(),
                current: photo.image.clone(),
            }
        }))
    }

    async fn compare_and_swap(
        &self,
        payload: &CorrelationPayload,
        expected: &Value,
        new: &Value,
    ) -> anyhow::Result<CasOutcome> {
        let mut photos = self.photos.write().await;
        let Some(photo) = photos.get_mut(&payload.record_id) else {
            return Ok(CasOutcome::Missing);
        };

        if photo.image.as_ref() == Some(expected) {
            photo.image = Some(new.clone());
            Ok(CasOutcome::Swapped)
        } else {
            Ok(CasOutcome::Conflict)
        }
    }
}

/// Cleanup queue that only records what it would delete
///
/// A real implementation would delete the objects from the bucket in a
/// background worker.
#[derive(Debug, Default)]
pub struct InMemoryCleanupQueue {
    tasks: Mutex<Vec<CleanupTask>>,
}

impl InMemoryCleanupQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all queued tasks
    #[allow(dead_code)]
    pub fn drain(&self) -> Vec<CleanupTask> {
        std::mem::take(&mut self.tasks.lock().unwrap())
    }
}

#[async_trait]
impl CleanupQueue for InMemoryCleanupQueue {
    async fn enqueue(&self, task: CleanupTask) -> anyhow::Result<()> {
        tracing::info!(
            task_id = %task.id,
            urls = task.urls.len(),
            "queued orphaned outputs for deletion"
        );
        self.tasks.lock().unwrap().push(task);
        Ok(())
    }
}
