//! Shared application state

use std::sync::Arc;

use offload_attacher::{ProcessorRegistry, Reconciler};
use offload_client::TranscoderApi;

use crate::config::DemoConfig;
use crate::store::{InMemoryCleanupQueue, InMemoryStore};

/// State handed to every handler and background task
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DemoConfig>,
    pub store: Arc<InMemoryStore>,
    pub cleanup: Arc<InMemoryCleanupQueue>,
    pub registry: Arc<ProcessorRegistry>,
    pub api: Arc<dyn TranscoderApi>,
    pub reconciler: Arc<Reconciler>,
}
