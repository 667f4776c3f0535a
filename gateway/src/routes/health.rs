//! Health and introspection endpoints.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use vector_store::CollectionStats;

/// `GET /` — project information.
pub async fn root() -> Json<Value> {
    Json(json!({
        "project": "MultiSense Agent",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multi-Modal AI Chatbot with WhatsApp Integration",
        "health": "/health",
        "capabilities": [
            "text_chat",
            "voice_transcription",
            "image_analysis",
            "pdf_rag_ingestion",
            "whatsapp_integration",
        ],
    }))
}

/// `GET /health` — service status: vector store reachability and live
/// session count.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let stats = state.rag.stats().await;
    let active_sessions = state.memory.active_sessions().await.len();

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "vector_store": stats,
            "active_sessions": active_sessions,
        },
    }))
}

/// `GET /api/v1/knowledge-base/stats` — collection statistics.
pub async fn knowledge_base_stats(State(state): State<AppState>) -> Json<CollectionStats> {
    Json(state.rag.stats().await)
}
