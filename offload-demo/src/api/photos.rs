//! Photo API Handlers
//!
//! CRUD over photos. Creating a photo persists it with its cached upload
//! and kicks off background transcoding; the attachment flips to the
//! processed versions once reconciliation runs.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use offload_attacher::reconciler::attachment_value;
use offload_core::UploadedFileRef;

use crate::api::error::{ApiError, ApiResult};
use crate::service::processing;
use crate::state::AppState;
use crate::store::Photo;

/// Request body for photo creation
#[derive(Debug, Deserialize)]
pub struct CreatePhotoRequest {
    pub title: String,
    /// Cached upload reference produced by the client-side direct upload
    pub image: UploadedFileRef,
}

/// POST /photos
/// Persists a photo and starts transcoding its upload
pub async fn create_photo(
    State(state): State<AppState>,
    Json(request): Json<CreatePhotoRequest>,
) -> ApiResult<Json<Photo>> {
    if request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title cannot be empty".to_string()));
    }

    let cached = attachment_value(&request.image);
    let photo = state.store.create(request.title, cached).await;
    tracing::info!(photo_id = %photo.id, "created photo, starting processing");

    processing::spawn_processing(state.clone(), photo.clone(), request.image);

    Ok(Json(photo))
}

/// GET /photos
/// Lists all photos, newest first
pub async fn list_photos(State(state): State<AppState>) -> Json<Vec<Photo>> {
    Json(state.store.list().await)
}

/// GET /photos/{id}
pub async fn get_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Photo>> {
    state
        .store
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("photo {id} not found")))
}

/// DELETE /photos/{id}
///
/// In-flight assemblies for a deleted photo resolve as orphans when their
/// results come back.
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Photo>> {
    state
        .store
        .delete(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("photo {id} not found")))
}
