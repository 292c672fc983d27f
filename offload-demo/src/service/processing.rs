//! Background photo processing
//!
//! Submits the `thumbnails` assembly for a freshly created photo. With a
//! webhook URL configured, the story ends at submission and the webhook
//! endpoint reconciles later; without one, this task polls the assembly
//! and reconciles inline.

use offload_attacher::{ProcessContext, process_attachment, reconciler::attachment_value};
use offload_client::wait_until_finished;
use offload_core::{CorrelationPayload, UploadedFileRef};

use crate::state::AppState;
use crate::store::{ATTACHMENT_NAME, Photo, RECORD_CLASS};

/// Starts processing a photo's cached upload in the background
pub fn spawn_processing(state: AppState, photo: Photo, cached: UploadedFileRef) {
    tokio::spawn(async move {
        if let Err(err) = process_photo(&state, &photo, cached).await {
            tracing::error!(photo_id = %photo.id, "processing failed: {err:#}");
        }
    });
}

async fn process_photo(
    state: &AppState,
    photo: &Photo,
    cached: UploadedFileRef,
) -> anyhow::Result<()> {
    let ctx = ProcessContext {
        correlation: CorrelationPayload {
            record_class: RECORD_CLASS.to_string(),
            record_id: photo.id.clone(),
            name: ATTACHMENT_NAME.to_string(),
            data: attachment_value(&cached),
        },
        file: cached,
        cache: state.config.cache_descriptor(),
        store: state.config.store_descriptor(),
        notify_url: state.config.notify_url.clone(),
    };

    let status = process_attachment(&state.registry, "thumbnails", &ctx, state.api.as_ref()).await?;

    // with a webhook configured, completion arrives over HTTP instead
    if status.notify_url.is_some() {
        return Ok(());
    }

    let finished = wait_until_finished(state.api.as_ref(), status, &state.config.poll).await?;
    let outcome = state
        .reconciler
        .reconcile(&finished, state.store.as_ref(), state.cleanup.as_ref())
        .await?;
    tracing::info!(photo_id = %photo.id, ?outcome, "photo processing reconciled");

    Ok(())
}
