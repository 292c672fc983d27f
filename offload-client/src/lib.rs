//! Offload HTTP Client
//!
//! A type-safe HTTP client for the cloud transcoding service, plus the
//! signature and polling primitives the rest of the stack builds on.
//!
//! # Example
//!
//! ```no_run
//! use offload_client::{Credentials, TranscoderApi, TranscoderClient};
//! use offload_core::AssemblySpec;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), offload_client::ClientError> {
//!     let client = TranscoderClient::new(Credentials::new("key", "secret"));
//!     let status = client.submit(&AssemblySpec::default()).await?;
//!     println!("Submitted assembly: {}", status.assembly_id);
//!     Ok(())
//! }
//! ```

mod assemblies;
pub mod config;
pub mod error;
pub mod signature;
pub mod tracker;

// Re-export commonly used types
pub use assemblies::Notification;
pub use config::{ConfigError, Credentials};
pub use error::{ClientError, Result};
pub use signature::SignatureError;
pub use tracker::{PollConfig, wait_until_finished};

use async_trait::async_trait;
use offload_core::{AssemblySpec, AssemblyStatus};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Default API endpoint of the transcoding service
pub const DEFAULT_API_URL: &str = "https://api2.transloadit.com";

/// RPC surface of the transcoding service
///
/// The rest of the stack talks to this trait, not to the concrete HTTP
/// client, so workers and tests can substitute their own transport.
#[async_trait]
pub trait TranscoderApi: Send + Sync {
    /// Submits an assembly spec, returning its initial status
    ///
    /// A service-reported error surfaces as [`ClientError::Response`];
    /// there is no automatic retry.
    async fn submit(&self, spec: &AssemblySpec) -> Result<AssemblyStatus>;

    /// Re-fetches the current status from an assembly URL
    async fn fetch(&self, assembly_url: &str) -> Result<AssemblyStatus>;

    /// Lists the delivery attempts recorded for an assembly's webhook
    async fn notifications(&self, assembly_id: &str) -> Result<Vec<Notification>>;
}

/// HTTP client for the transcoding service API
#[derive(Debug, Clone)]
pub struct TranscoderClient {
    /// Base URL of the service API
    base_url: String,
    credentials: Credentials,
    /// HTTP client instance
    client: Client,
}

impl TranscoderClient {
    /// Creates a client against the default API endpoint
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials, DEFAULT_API_URL)
    }

    /// Creates a client against a custom endpoint (e.g. a test server)
    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client: Client::new(),
        }
    }

    /// The base URL this client targets
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Checks the status code and deserializes the JSON body
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(format!("failed to parse JSON response: {e}")))
    }
}

/// Raises a service-reported assembly error as [`ClientError::Response`]
pub fn ensure_ok(status: AssemblyStatus) -> Result<AssemblyStatus> {
    if let Some(code) = &status.error {
        return Err(ClientError::Response {
            code: code.clone(),
            message: status.message.clone().unwrap_or_default(),
            assembly_url: status.assembly_url.clone(),
        });
    }
    Ok(status)
}
