use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::matching::config::AppConfig;
use crate::matching::embeddings::create_embedding_model;
use crate::matching::handlers::{create_router, AppState};
use crate::matching::ranker::SimilarityRanker;
use crate::matching::store::DocumentStore;

pub mod matching;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = AppConfig::config_path();
    let config = AppConfig::load(&config_path)?;
    info!(
        ?config_path,
        backend = ?config.embeddings.backend,
        model = %config.embeddings.model,
        "configuration loaded"
    );

    let store = DocumentStore::open(&config.store.path)?;
    let model = create_embedding_model(&config.embeddings)?;
    let state = AppState::new(Arc::new(store), Arc::new(SimilarityRanker::new(model)));

    let listener = TcpListener::bind(config.server.address()).await?;
    info!(address = %config.server.address(), "listening");

    axum::serve(listener, create_router(state, &config.server.cors_origins))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
