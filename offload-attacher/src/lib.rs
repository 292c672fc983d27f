//! Offload Attacher
//!
//! The reconciliation half of the coordinator: takes a finished assembly's
//! results and applies them back onto the persisted record that originally
//! submitted it, handling the races between "attachment changed before
//! processing finished" and "processing finished after attachment changed".
//!
//! Persistence and background deletion are collaborator traits
//! ([`RecordStore`], [`CleanupQueue`]); this crate never mutates a record
//! except through the store's compare-and-swap primitive.

pub mod error;
pub mod persistence;
pub mod process;
pub mod reconciler;
pub mod registry;
pub mod webhook;

pub use error::AttachError;
pub use persistence::{AttachmentRecord, CasOutcome, CleanupQueue, CleanupTask, RecordStore};
pub use process::process_attachment;
pub use reconciler::{ReconcileOutcome, ReconciledFiles, Reconciler};
pub use registry::{ProcessContext, ProcessorFn, ProcessorRegistry, SaverFn};
pub use webhook::{WebhookParams, receive_webhook};
