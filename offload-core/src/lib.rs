//! Offload Core
//!
//! Domain types for delegating attachment processing to a cloud transcoding
//! service.
//!
//! This crate contains:
//! - Step / pipeline types: immutable chains of processing steps
//! - Assembly spec and builder: turns pipelines into a submittable job
//! - Storage descriptors: derive import/export steps per storage backend
//! - Correlation payload: round-trips local record identity through the service
//! - Status and result types: the shape the service reports back
//!
//! No I/O happens here. Submission and persistence live in `offload-client`
//! and `offload-attacher` respectively.

pub mod assembly;
pub mod correlation;
pub mod error;
pub mod file;
pub mod pipeline;
pub mod status;
pub mod step;
pub mod storage;

pub use assembly::{AssemblyBuilder, AssemblySource, AssemblySpec, DEFAULT_EXPORT_PATH};
pub use correlation::CorrelationPayload;
pub use error::Error;
pub use file::UploadedFileRef;
pub use pipeline::{Multiplicity, TranscodePipeline};
pub use status::{ASSEMBLY_COMPLETED, AssemblyStatus, ResultDescriptor};
pub use step::Step;
pub use storage::StorageDescriptor;
