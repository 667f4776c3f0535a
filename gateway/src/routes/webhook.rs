//! WhatsApp webhook endpoints and the background message worker.
//!
//! The POST handler acknowledges immediately and processes in a spawned
//! task; a semaphore caps how many messages run at once so a webhook burst
//! cannot exhaust the model API.

use crate::error::ApiError;
use crate::processor::ChatResponse;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use memory::MessageType;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{error, info, warn};
use whatsapp::{parse_webhook, IncomingMessage};

/// `GET /api/v1/webhook/whatsapp` — Meta's verification handshake.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, ApiError> {
    let get = |key: &str| params.get(key).map(String::as_str).unwrap_or_default();

    match state
        .whatsapp
        .verify_webhook(get("hub.mode"), get("hub.verify_token"), get("hub.challenge"))
    {
        Some(challenge) => Ok(challenge.to_string()),
        None => Err(ApiError::Forbidden),
    }
}

/// `POST /api/v1/webhook/whatsapp` — inbound message notifications.
///
/// Returns 200 right away; the actual work happens in the background so Meta
/// does not retry slow deliveries.
pub async fn receive(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    let Some(message) = parse_webhook(&payload) else {
        // Status update or something else we don't handle.
        return Json(json!({ "status": "ok" }));
    };

    let message_id = message.message_id.clone();
    tokio::spawn(process_message(state, message));

    Json(json!({ "status": "received", "message_id": message_id }))
}

/// Background worker for one inbound message.
async fn process_message(state: AppState, message: IncomingMessage) {
    let _permit = match state.webhook_permits.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return, // semaphore closed: shutting down
    };

    let whatsapp = state.whatsapp.clone();
    whatsapp.mark_as_read(&message.message_id).await;
    if let Err(e) = whatsapp
        .send_reaction(&message.from, &message.message_id, "⏳")
        .await
    {
        warn!(error = %e, "processing reaction failed");
    }

    match respond(&state, &message).await {
        Ok(result) => {
            if let Err(e) = whatsapp.send_text(&message.from, &result.response).await {
                error!(to = %message.from, error = %e, "sending whatsapp reply failed");
                return;
            }
            if let Err(e) = whatsapp
                .send_reaction(&message.from, &message.message_id, "✅")
                .await
            {
                warn!(error = %e, "done reaction failed");
            }
            info!(
                to = %message.from,
                message_type = ?message.message_type,
                processing_time = result.processing_time,
                "whatsapp response sent"
            );
        }
        Err(e) => {
            error!(
                message_id = %message.message_id,
                message_type = ?message.message_type,
                error = %e,
                "whatsapp processing failed"
            );
            let _ = whatsapp
                .send_text(
                    &message.from,
                    "❌ Sorry, I encountered an error processing your message. Please try again.",
                )
                .await;
            let _ = whatsapp
                .send_reaction(&message.from, &message.message_id, "❌")
                .await;
        }
    }
}

/// Routes one message to its pipeline. The sender's phone number doubles as
/// the conversation session id.
async fn respond(
    state: &AppState,
    message: &IncomingMessage,
) -> Result<ChatResponse, anyhow::Error> {
    let session_id = message.from.as_str();

    match message.message_type {
        MessageType::Text => {
            let text = message
                .text
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Text message without body"))?;
            state.processor.process_text(text, session_id, true).await
        }
        MessageType::Voice => {
            let audio = download(state, message).await?;
            state.processor.process_voice(&audio, session_id).await
        }
        MessageType::Image => {
            let image = download(state, message).await?;
            state
                .processor
                .process_image(&image, session_id, message.caption.as_deref())
                .await
        }
        MessageType::Document => {
            let data = download(state, message).await?;
            let filename = message.caption.as_deref().unwrap_or("document.pdf");
            state
                .processor
                .process_document(&data, session_id, filename, message.mime_type.as_deref())
                .await
        }
    }
}

async fn download(state: &AppState, message: &IncomingMessage) -> Result<Vec<u8>, anyhow::Error> {
    let media_id = message
        .media_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("Media message without media id"))?;
    state.whatsapp.download_media(media_id).await
}
