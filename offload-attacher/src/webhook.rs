//! Webhook receive flow
//!
//! The service delivers completion notifications as form parameters:
//! `transloadit` (the status envelope as a JSON string) and `signature`
//! (hex HMAC over that exact string). The signature is verified against the
//! raw string BEFORE the JSON is parsed; a forged payload never reaches the
//! parser, let alone the reconciler.
//!
//! HTTP handlers acknowledge deliveries with an empty success response
//! regardless of the outcome here, so a permanently-invalid request is not
//! retried forever by the service. Internal failures are for logging.

use serde::Deserialize;

use offload_core::AssemblyStatus;

use crate::error::AttachError;
use crate::persistence::{CleanupQueue, RecordStore};
use crate::reconciler::{ReconcileOutcome, Reconciler};

/// The two parameters of one webhook delivery
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookParams {
    /// Raw JSON string of the status envelope
    pub transloadit: String,
    /// Hex HMAC-SHA1 of `transloadit`
    pub signature: String,
}

/// Verifies, parses and reconciles one webhook delivery
pub async fn receive_webhook(
    params: &WebhookParams,
    auth_secret: &str,
    reconciler: &Reconciler,
    store: &dyn RecordStore,
    cleanup: &dyn CleanupQueue,
) -> Result<ReconcileOutcome, AttachError> {
    // authenticity first; the payload stays opaque until this passes
    offload_client::signature::verify(params.transloadit.as_bytes(), &params.signature, auth_secret)?;

    let status: AssemblyStatus = serde_json::from_str(&params.transloadit)?;
    reconciler.reconcile(&status, store, cleanup).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    use offload_client::signature::sign;
    use offload_core::{CorrelationPayload, StorageDescriptor};

    use crate::persistence::{AttachmentRecord, CasOutcome, CleanupTask};

    const SECRET: &str = "auth_secret";

    struct SingleRecordStore {
        record: Mutex<AttachmentRecord>,
    }

    #[async_trait]
    impl RecordStore for SingleRecordStore {
        async fn load(
            &self,
            _payload: &CorrelationPayload,
        ) -> anyhow::Result<Option<AttachmentRecord>> {
            Ok(Some(self.record.lock().unwrap().clone()))
        }

        async fn compare_and_swap(
            &self,
            _payload: &CorrelationPayload,
            expected: &Value,
            new: &Value,
        ) -> anyhow::Result<CasOutcome> {
            let mut record = self.record.lock().unwrap();
            if record.current.as_ref() == Some(expected) {
                record.current = Some(new.clone());
                Ok(CasOutcome::Swapped)
            } else {
                Ok(CasOutcome::Conflict)
            }
        }
    }

    struct NoopQueue;

    #[async_trait]
    impl CleanupQueue for NoopQueue {
        async fn enqueue(&self, _task: CleanupTask) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn reconciler() -> Reconciler {
        Reconciler::new(StorageDescriptor::ObjectStore {
            name: "store".to_string(),
            bucket: "bucket".to_string(),
            region: "us-east-1".to_string(),
            access_key: "key".to_string(),
            secret_key: "secret".to_string(),
            prefix: Some("store".to_string()),
        })
    }

    fn cached() -> Value {
        json!({"id": "cached.jpg", "storage": "cache", "metadata": {}})
    }

    fn store() -> SingleRecordStore {
        SingleRecordStore {
            record: Mutex::new(AttachmentRecord {
                record_class: "Photo".to_string(),
                record_id: "7".to_string(),
                name: "image".to_string(),
                current: Some(cached()),
            }),
        }
    }

    fn envelope() -> String {
        json!({
            "assembly_id": "abc123",
            "ok": "ASSEMBLY_COMPLETED",
            "fields": {
                "attacher": {
                    "record_class": "Photo",
                    "record_id": "7",
                    "name": "image",
                    "data": cached(),
                },
                "result_name": "import",
                "multiple": "single",
            },
            "results": {
                "import": [{
                    "url": "https://s3.amazonaws.com/store/x.jpg",
                    "name": "x.jpg", "size": 100, "mime": "image/jpeg",
                    "meta": {"width": 100, "height": 67},
                }]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_verified_webhook_is_reconciled() {
        let payload = envelope();
        let params = WebhookParams {
            signature: sign(payload.as_bytes(), SECRET),
            transloadit: payload,
        };
        let store = store();

        let outcome = receive_webhook(&params, SECRET, &reconciler(), &store, &NoopQueue)
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Stored(_)));
        let record = store.record.lock().unwrap();
        assert_eq!(record.current.as_ref().unwrap()["id"], "x.jpg");
    }

    #[tokio::test]
    async fn test_tampered_payload_is_rejected_before_parsing() {
        let payload = envelope();
        let signature = sign(payload.as_bytes(), SECRET);

        // tampered envelope that is not even valid JSON: if verification
        // did not run first, this would surface as a Decode error
        let params = WebhookParams {
            transloadit: format!("{payload}tampered"),
            signature,
        };

        let result = receive_webhook(&params, SECRET, &reconciler(), &store(), &NoopQueue).await;
        assert!(matches!(result, Err(AttachError::Signature(_))));
    }

    #[tokio::test]
    async fn test_correctly_signed_garbage_fails_decoding() {
        let payload = "not json at all".to_string();
        let params = WebhookParams {
            signature: sign(payload.as_bytes(), SECRET),
            transloadit: payload,
        };

        let result = receive_webhook(&params, SECRET, &reconciler(), &store(), &NoopQueue).await;
        assert!(matches!(result, Err(AttachError::Decode(_))));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected() {
        let payload = envelope();
        let params = WebhookParams {
            signature: sign(payload.as_bytes(), "other_secret"),
            transloadit: payload,
        };

        let result = receive_webhook(&params, SECRET, &reconciler(), &store(), &NoopQueue).await;
        assert!(matches!(result, Err(AttachError::Signature(_))));
    }
}
