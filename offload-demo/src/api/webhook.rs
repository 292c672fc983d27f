//! Transcoding Service Webhook Handler
//!
//! Receives completion callbacks. The endpoint always acknowledges with an
//! empty 200: the service treats anything else as a delivery failure and
//! retries, which is pointless for permanently invalid payloads (bad
//! signature, unknown record). Real failures are logged instead.

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
};
use serde::Deserialize;

use offload_attacher::{AttachError, WebhookParams, receive_webhook};

use crate::state::AppState;

/// Form body the service posts; both fields optional so that malformed
/// deliveries still reach the handler (and get acknowledged)
#[derive(Debug, Deserialize)]
pub struct WebhookForm {
    pub transloadit: Option<String>,
    pub signature: Option<String>,
}

/// POST /webhooks/transloadit
///
/// The extractor is wrapped in `Result` so that deliveries whose body is
/// not valid form encoding are still acknowledged rather than rejected
/// upstream of the handler.
pub async fn receive_transloadit(
    State(state): State<AppState>,
    form: Result<Form<WebhookForm>, FormRejection>,
) -> StatusCode {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::warn!("webhook delivery body is not form-encoded: {rejection}");
            return StatusCode::OK;
        }
    };
    let (Some(transloadit), Some(signature)) = (form.transloadit, form.signature) else {
        tracing::warn!("webhook delivery missing transloadit or signature parameter");
        return StatusCode::OK;
    };

    let params = WebhookParams {
        transloadit,
        signature,
    };
    let result = receive_webhook(
        &params,
        &state.config.credentials.auth_secret,
        &state.reconciler,
        state.store.as_ref(),
        state.cleanup.as_ref(),
    )
    .await;

    match result {
        Ok(outcome) => tracing::info!(?outcome, "webhook reconciled"),
        Err(AttachError::Signature(err)) => {
            tracing::warn!("webhook signature rejected: {err}");
        }
        Err(err) => tracing::error!("webhook processing failed: {err}"),
    }

    StatusCode::OK
}
