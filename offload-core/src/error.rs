//! Error types for assembly construction and result mapping

use thiserror::Error;

/// Errors raised while building an assembly spec or mapping results back
/// into uploaded file references.
///
/// Build-time variants (duplicate steps, missing imports, empty pipelines)
/// are caller errors and are raised synchronously, before any network call.
#[derive(Debug, Error)]
pub enum Error {
    /// Two steps share a name but have different definitions
    #[error("duplicate step name {0:?} with conflicting definitions")]
    DuplicateStep(String),

    /// A pipeline's first step is not an import step
    #[error("pipeline is missing an import step")]
    MissingImportStep,

    /// A pipeline with no steps was passed to the builder
    #[error("pipeline has no steps defined")]
    EmptyPipeline,

    /// The storage backend cannot perform the requested operation
    #[error("storage {0:?} does not support this operation")]
    UnsupportedStorage(String),

    /// A result URL does not live under the storage prefix
    #[error("URL path {url:?} doesn't start with storage prefix {prefix:?}")]
    UrlPrefixMismatch { url: String, prefix: String },

    /// A file URL could not be parsed
    #[error("invalid file URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
