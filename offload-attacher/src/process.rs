//! Processing entry point
//!
//! Looks up a registered processor, builds the assembly spec and submits
//! it. Tracking the submitted assembly is the caller's concern: poll via
//! `offload_client::wait_until_finished`, or let the webhook flow pick the
//! completion up.

use std::time::Instant;

use tracing::info;

use offload_client::TranscoderApi;
use offload_core::AssemblyStatus;

use crate::error::AttachError;
use crate::registry::{ProcessContext, ProcessorRegistry};

/// Builds and submits an assembly for one attachment
pub async fn process_attachment(
    registry: &ProcessorRegistry,
    processor_name: &str,
    ctx: &ProcessContext,
    api: &dyn TranscoderApi,
) -> Result<AssemblyStatus, AttachError> {
    let processor = registry.processor(processor_name)?;

    let started = Instant::now();
    let spec = processor(ctx)?;
    let status = api.submit(&spec).await?;

    info!(
        processor = processor_name,
        duration_ms = started.elapsed().as_millis() as u64,
        assembly_id = %status.assembly_id,
        record_id = %ctx.correlation.record_id,
        "submitted assembly"
    );

    Ok(status)
}
