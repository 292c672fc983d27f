//! API Module
//!
//! HTTP API layer for the demo app.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod photos;
pub mod webhook;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Photo endpoints
        .route("/photos", get(photos::list_photos))
        .route("/photos", post(photos::create_photo))
        .route("/photos/{id}", get(photos::get_photo))
        .route("/photos/{id}", delete(photos::delete_photo))
        // Transcoding service callback
        .route("/webhooks/transloadit", post(webhook::receive_transloadit))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
