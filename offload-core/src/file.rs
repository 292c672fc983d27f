//! Uploaded file references
//!
//! Local representation of a stored object, built from the result
//! descriptors the transcoding service reports.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::Error;
use crate::status::ResultDescriptor;
use crate::storage::StorageDescriptor;

/// Local representation of one stored object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFileRef {
    /// Location of the object within its storage (object key, or the full
    /// URL for URL-backed storages)
    pub id: String,
    /// Storage key the object lives under (e.g. "store")
    pub storage: String,
    pub metadata: Map<String, Value>,
}

impl UploadedFileRef {
    /// Builds a file reference from one service result descriptor
    ///
    /// The id is derived from the result URL according to the storage kind:
    /// object stores take the URL path below the storage prefix, URL stores
    /// take the URL itself. Basic metadata (`filename`, `size`, `mime_type`)
    /// is taken from the descriptor's top-level fields; the descriptor's
    /// `meta` map is merged in afterwards without overriding them.
    pub fn from_result(
        result: &ResultDescriptor,
        storage: &StorageDescriptor,
    ) -> Result<Self, Error> {
        let id = match storage {
            StorageDescriptor::ObjectStore { prefix, .. } => {
                object_id(&result.url, prefix.as_deref())?
            }
            StorageDescriptor::UrlStore { .. } => result.url.clone(),
            StorageDescriptor::GoogleCloudStore { .. } | StorageDescriptor::YouTubeStore { .. } => {
                return Err(Error::UnsupportedStorage(storage.name().to_string()));
            }
        };

        let mut metadata = Map::new();
        metadata.insert("filename".to_string(), Value::String(result.name.clone()));
        metadata.insert("size".to_string(), Value::from(result.size));
        metadata.insert("mime_type".to_string(), Value::String(result.mime.clone()));

        // the service's meta never wins over the basic fields
        for (key, value) in &result.meta {
            metadata.entry(key.clone()).or_insert_with(|| value.clone());
        }

        Ok(Self {
            id,
            storage: storage.name().to_string(),
            metadata,
        })
    }
}

fn object_id(raw_url: &str, prefix: Option<&str>) -> Result<String, Error> {
    let url = Url::parse(raw_url)?;
    let path = url.path().trim_start_matches('/');
    match prefix {
        Some(prefix) => path
            .strip_prefix(&format!("{prefix}/"))
            .map(str::to_string)
            .ok_or_else(|| Error::UrlPrefixMismatch {
                url: raw_url.to_string(),
                prefix: prefix.to_string(),
            }),
        None => Ok(path.to_string()),
    }
}
