//! Webhook payload parsing.
//!
//! Meta posts a deeply nested envelope; only the first message of the first
//! change matters here. Status-update payloads (delivery receipts) carry no
//! `messages` array and parse to `None`.

use memory::MessageType;
use tracing::debug;

/// One inbound user message, flattened out of the webhook envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub message_id: String,
    pub from: String,
    pub timestamp: String,
    pub message_type: MessageType,
    /// Body for text messages.
    pub text: Option<String>,
    /// Media id for voice, image, and document messages.
    pub media_id: Option<String>,
    pub mime_type: Option<String>,
    /// Caption for image and document messages.
    pub caption: Option<String>,
}

/// Extracts the first message from a webhook payload. Returns `None` for
/// status updates, unsupported message types, and malformed envelopes.
pub fn parse_webhook(payload: &serde_json::Value) -> Option<IncomingMessage> {
    let message = payload
        .get("entry")?
        .get(0)?
        .get("changes")?
        .get(0)?
        .get("value")?
        .get("messages")?
        .get(0)?;

    let message_id = message.get("id")?.as_str()?.to_string();
    let from = message.get("from")?.as_str()?.to_string();
    let timestamp = message
        .get("timestamp")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let kind = message.get("type")?.as_str()?;

    let str_field = |media: &serde_json::Value, key: &str| {
        media.get(key).and_then(|v| v.as_str()).map(str::to_string)
    };

    let parsed = match kind {
        "text" => IncomingMessage {
            message_id,
            from,
            timestamp,
            message_type: MessageType::Text,
            text: str_field(message.get("text")?, "body"),
            media_id: None,
            mime_type: None,
            caption: None,
        },
        "audio" => {
            let audio = message.get("audio")?;
            IncomingMessage {
                message_id,
                from,
                timestamp,
                message_type: MessageType::Voice,
                text: None,
                media_id: str_field(audio, "id"),
                mime_type: str_field(audio, "mime_type"),
                caption: None,
            }
        }
        "image" => {
            let image = message.get("image")?;
            IncomingMessage {
                message_id,
                from,
                timestamp,
                message_type: MessageType::Image,
                text: None,
                media_id: str_field(image, "id"),
                mime_type: str_field(image, "mime_type"),
                caption: str_field(image, "caption"),
            }
        }
        "document" => {
            let document = message.get("document")?;
            IncomingMessage {
                message_id,
                from,
                timestamp,
                message_type: MessageType::Document,
                text: None,
                media_id: str_field(document, "id"),
                mime_type: str_field(document, "mime_type"),
                caption: str_field(document, "filename"),
            }
        }
        other => {
            debug!(message_type = other, "unsupported message type ignored");
            return None;
        }
    };

    Some(parsed)
}
