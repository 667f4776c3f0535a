//! # Multi-modal chatbot gateway
//!
//! HTTP front door for a chatbot that handles text, voice, images, and PDF
//! documents. Model calls go to the HuggingFace Inference API, document
//! retrieval to a Chroma vector store, and replies can flow back out through
//! the WhatsApp Business Cloud API.
//!
//! The composition root lives in [`state::AppState::from_config`]: every
//! service is built once and injected through trait objects, so tests swap in
//! fakes without touching the routes.

pub mod config;
pub mod error;
pub mod processor;
pub mod routes;
pub mod state;

pub use config::Config;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. Level comes from `RUST_LOG`,
/// defaulting to `info`. Call after loading `.env` so the variable applies.
pub fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

/// Builds the application state and runs the HTTP server until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    info!(
        chat_model = %config.hf_chat_model,
        collection = %config.chroma_collection_name,
        "gateway starting"
    );

    let state = state::AppState::from_config(&config);

    // Startup check: report the vector store status without blocking boot.
    let stats = state.rag.stats().await;
    if stats.status == "connected" {
        info!(documents = stats.document_count, "vector store connected");
    } else {
        warn!(status = %stats.status, "vector store not reachable at startup");
    }

    let app = routes::router(state);
    let addr = format!("{}:{}", config.app_host, config.app_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
