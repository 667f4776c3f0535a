//! Conversation session management endpoints.

use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

/// `GET /api/v1/sessions` — ids of all live sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Json<Value> {
    let sessions = state.memory.active_sessions().await;
    Json(json!({
        "count": sessions.len(),
        "active_sessions": sessions,
    }))
}

/// `DELETE /api/v1/sessions/{session_id}` — drop one session's history.
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<Value> {
    let status = if state.memory.clear(&session_id).await {
        "cleared"
    } else {
        "not_found"
    };
    Json(json!({ "status": status, "session_id": session_id }))
}
