//! Error types for the transcoder client

use thiserror::Error;

use crate::config::ConfigError;
use crate::signature::SignatureError;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the transcoding service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-success status code
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body from the API
        message: String,
    },

    /// Failed to parse a response body
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The service reported a failure for a submitted or completed assembly
    ///
    /// Carries the raw error code/message/assembly-url for diagnostics.
    /// Retrying is the caller's responsibility.
    #[error("assembly failed ({code}): {message} [{assembly_url}]")]
    Response {
        code: String,
        message: String,
        assembly_url: String,
    },

    /// A blocking wait exceeded its configured ceiling
    ///
    /// Distinct from a service-reported error: the assembly may still be
    /// running on the service side.
    #[error("assembly {assembly_id} not finished after {waited_secs}s")]
    TimedOut { assembly_id: String, waited_secs: u64 },

    /// Invalid webhook or request signature
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Missing or invalid credentials
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Whether this error was reported by the service itself rather than
    /// the transport
    pub fn is_service_error(&self) -> bool {
        matches!(self, Self::Response { .. })
    }
}
