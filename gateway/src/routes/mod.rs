//! Route registration.

mod chat;
mod health;
mod sessions;
mod webhook;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

/// Uploads are capped at 50 MB; PDFs and voice notes stay well under this.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/api/v1/chat", post(chat::chat))
        .route("/api/v1/upload", post(chat::upload_document))
        .route("/api/v1/chat/voice", post(chat::chat_voice))
        .route("/api/v1/chat/image", post(chat::chat_image))
        .route("/api/v1/sessions", get(sessions::list_sessions))
        .route("/api/v1/sessions/{session_id}", delete(sessions::clear_session))
        .route("/api/v1/knowledge-base/stats", get(health::knowledge_base_stats))
        .route(
            "/api/v1/webhook/whatsapp",
            get(webhook::verify).post(webhook::receive),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
