//! Assembly status tracking
//!
//! Polls an assembly until it reaches a terminal state. Used when no
//! webhook URL is configured (or in environments where inbound callbacks
//! are unreachable, like local development); the verified webhook delivery
//! is otherwise the authoritative completion signal.
//!
//! Abandoning a wait does not cancel anything remotely: the assembly keeps
//! running to completion or timeout on the service side.

use std::time::Duration;

use offload_core::AssemblyStatus;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::{TranscoderApi, ensure_ok};

/// Polling behavior for blocking waits
///
/// The 1-second fixed interval mirrors the service SDKs' baseline; raising
/// `backoff_factor` above 1.0 switches to capped exponential backoff.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the first and between subsequent polls
    pub interval: Duration,
    /// Multiplier applied to the delay after every poll (1.0 = fixed)
    pub backoff_factor: f64,
    /// Ceiling for the between-poll delay
    pub max_interval: Duration,
    /// Overall ceiling for one wait; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(15),
            timeout: Some(Duration::from_secs(300)),
        }
    }
}

/// Blocks until the assembly reaches a terminal state
///
/// Returns the final status on completion. A service-reported failure
/// surfaces as [`ClientError::Response`]; exceeding the configured timeout
/// surfaces as [`ClientError::TimedOut`] without touching the remote job.
pub async fn wait_until_finished(
    api: &dyn TranscoderApi,
    mut status: AssemblyStatus,
    config: &PollConfig,
) -> Result<AssemblyStatus> {
    let started = Instant::now();
    let mut interval = config.interval;

    while !status.finished() {
        if let Some(timeout) = config.timeout
            && started.elapsed() >= timeout
        {
            return Err(ClientError::TimedOut {
                assembly_id: status.assembly_id.clone(),
                waited_secs: started.elapsed().as_secs(),
            });
        }

        sleep(interval).await;
        debug!(assembly_id = %status.assembly_id, "polling assembly status");
        status = api.fetch(&status.assembly_url).await?;

        interval = Duration::from_secs_f64(
            (interval.as_secs_f64() * config.backoff_factor)
                .min(config.max_interval.as_secs_f64()),
        );
    }

    ensure_ok(status)
}
