//! Error types for processing and reconciliation

use thiserror::Error;

use offload_client::{ClientError, SignatureError};

/// Errors raised while processing attachments or reconciling results
///
/// Staleness and orphaned records are NOT errors: they are routine
/// outcomes of concurrent mutation and are reported through
/// [`ReconcileOutcome`](crate::ReconcileOutcome) instead.
#[derive(Debug, Error)]
pub enum AttachError {
    /// No processor registered under the requested name
    #[error("transloadit processor {0:?} not registered")]
    ProcessorNotRegistered(String),

    /// No saver registered under the requested name
    #[error("transloadit saver {0:?} not registered")]
    SaverNotRegistered(String),

    /// A pipeline declared `single` produced more than one output
    #[error("step {step:?} produced {count} files but wasn't marked as multiple")]
    Multiplicity { step: String, count: usize },

    /// A pipeline declared `single` produced no output at all
    #[error("step {step:?} produced no result files")]
    MissingResults { step: String },

    /// The assembly itself reported an error; reconciliation short-circuits
    #[error("assembly failed ({code}): {message} [{assembly_url}]")]
    Response {
        code: String,
        message: String,
        assembly_url: String,
    },

    /// The echoed envelope lacks the fields reconciliation needs
    #[error("malformed assembly envelope: {0}")]
    MalformedEnvelope(String),

    /// Webhook signature verification failed; treat as potential forgery
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// A payload failed to decode as JSON
    #[error("failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The record store collaborator failed
    #[error("record store error: {0}")]
    Store(#[source] anyhow::Error),

    /// The cleanup queue collaborator failed
    #[error("cleanup queue error: {0}")]
    Cleanup(#[source] anyhow::Error),

    #[error(transparent)]
    Core(#[from] offload_core::Error),

    #[error(transparent)]
    Client(#[from] ClientError),
}
