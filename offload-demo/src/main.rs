use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offload_attacher::Reconciler;
use offload_client::TranscoderClient;

pub mod api;
pub mod config;
pub mod service;
pub mod state;
pub mod store;
pub mod uploader;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offload_demo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Offload demo app...");

    let config = config::DemoConfig::from_env().expect("Failed to load configuration");
    config.validate().expect("Invalid configuration");

    let client = match &config.api_url {
        Some(url) => TranscoderClient::with_base_url(config.credentials.clone(), url.clone()),
        None => TranscoderClient::new(config.credentials.clone()),
    };

    let state = state::AppState {
        reconciler: Arc::new(Reconciler::new(config.store_descriptor())),
        api: Arc::new(client),
        registry: Arc::new(uploader::build_registry()),
        store: Arc::new(store::InMemoryStore::new()),
        cleanup: Arc::new(store::InMemoryCleanupQueue::new()),
        config: Arc::new(config),
    };

    let addr = state.config.bind_addr.clone();
    let app = api::create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
