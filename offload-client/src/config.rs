//! Transcoder credentials
//!
//! Auth credentials are required at setup; missing or empty values are
//! fatal at startup and never recovered from.

use thiserror::Error;

/// Configuration errors, raised once at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingVar(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Shared-secret credentials for the transcoding service
///
/// The secret signs outgoing assembly submissions and verifies inbound
/// webhook payloads.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub auth_key: String,
    pub auth_secret: String,
}

impl Credentials {
    pub fn new(auth_key: impl Into<String>, auth_secret: impl Into<String>) -> Self {
        Self {
            auth_key: auth_key.into(),
            auth_secret: auth_secret.into(),
        }
    }

    /// Reads credentials from the environment
    ///
    /// Expected environment variables:
    /// - TRANSLOADIT_AUTH_KEY (required)
    /// - TRANSLOADIT_AUTH_SECRET (required)
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth_key = std::env::var("TRANSLOADIT_AUTH_KEY")
            .map_err(|_| ConfigError::MissingVar("TRANSLOADIT_AUTH_KEY"))?;
        let auth_secret = std::env::var("TRANSLOADIT_AUTH_SECRET")
            .map_err(|_| ConfigError::MissingVar("TRANSLOADIT_AUTH_SECRET"))?;

        let credentials = Self {
            auth_key,
            auth_secret,
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Validates that both values are present
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth_key.is_empty() {
            return Err(ConfigError::Empty("auth_key"));
        }
        if self.auth_secret.is_empty() {
            return Err(ConfigError::Empty("auth_secret"));
        }
        Ok(())
    }
}
