//! Demo app configuration
//!
//! Everything comes from environment variables: the transcoding service
//! credentials, the object storage the results land in, and the optional
//! webhook URL. Without a webhook URL the app falls back to polling.

use offload_client::{Credentials, PollConfig};
use offload_core::StorageDescriptor;
use std::time::Duration;

/// Demo app configuration
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Transcoding service credentials
    pub credentials: Credentials,

    /// Base URL override for the service API (e.g. a local stub)
    pub api_url: Option<String>,

    /// Bucket the processed files are exported into
    pub bucket: String,

    /// Bucket region
    pub region: String,

    /// Storage access key
    pub access_key: String,

    /// Storage secret key
    pub secret_key: String,

    /// Key prefix for processed files within the bucket
    pub prefix: Option<String>,

    /// Publicly reachable webhook URL; when unset, completion is polled
    pub notify_url: Option<String>,

    /// Polling behavior for the no-webhook fallback
    pub poll: PollConfig,
}

impl DemoConfig {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - TRANSLOADIT_AUTH_KEY (required)
    /// - TRANSLOADIT_AUTH_SECRET (required)
    /// - TRANSLOADIT_API_URL (optional)
    /// - TRANSLOADIT_NOTIFY_URL (optional)
    /// - S3_BUCKET (required)
    /// - S3_REGION (required)
    /// - S3_ACCESS_KEY_ID (required)
    /// - S3_SECRET_ACCESS_KEY (required)
    /// - S3_PREFIX (optional)
    /// - DEMO_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - POLL_INTERVAL (optional, seconds, default: 1)
    /// - POLL_TIMEOUT (optional, seconds, default: 300)
    pub fn from_env() -> anyhow::Result<Self> {
        let credentials = Credentials::from_env()?;

        let bucket = required_var("S3_BUCKET")?;
        let region = required_var("S3_REGION")?;
        let access_key = required_var("S3_ACCESS_KEY_ID")?;
        let secret_key = required_var("S3_SECRET_ACCESS_KEY")?;

        let mut poll = PollConfig::default();
        if let Some(interval) = duration_var("POLL_INTERVAL") {
            poll.interval = interval;
        }
        if let Some(timeout) = duration_var("POLL_TIMEOUT") {
            poll.timeout = Some(timeout);
        }

        Ok(Self {
            bind_addr: std::env::var("DEMO_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            credentials,
            api_url: std::env::var("TRANSLOADIT_API_URL").ok(),
            bucket,
            region,
            access_key,
            secret_key,
            prefix: std::env::var("S3_PREFIX").ok(),
            notify_url: std::env::var("TRANSLOADIT_NOTIFY_URL").ok(),
            poll,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.credentials.validate()?;

        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.bucket.is_empty() {
            anyhow::bail!("bucket cannot be empty");
        }

        if self.region.is_empty() {
            anyhow::bail!("region cannot be empty");
        }

        if let Some(url) = &self.notify_url
            && !url.starts_with("http://")
            && !url.starts_with("https://")
        {
            anyhow::bail!("notify_url must start with http:// or https://");
        }

        if self.poll.interval == Duration::ZERO {
            anyhow::bail!("poll interval must be greater than 0");
        }

        Ok(())
    }

    /// Storage the processed files are exported into
    pub fn store_descriptor(&self) -> StorageDescriptor {
        StorageDescriptor::ObjectStore {
            name: "store".to_string(),
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            prefix: self.prefix.clone(),
        }
    }

    /// Storage the direct uploads are cached in
    ///
    /// The demo caches uploads behind presigned URLs, so imports go by URL
    /// rather than by bucket credentials.
    pub fn cache_descriptor(&self) -> StorageDescriptor {
        StorageDescriptor::UrlStore {
            name: "cache".to_string(),
        }
    }
}

fn required_var(name: &'static str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("{name} environment variable not set"))
}

fn duration_var(name: &'static str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}
