//! Graph API client.

use serde_json::json;
use tracing::{debug, info, warn};

/// WhatsApp limits one message body to 4096 chars; split below that so
/// formatting survives.
const MAX_MESSAGE_LEN: usize = 4000;

/// WhatsApp Business Cloud API client.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    api_token: String,
    phone_number_id: String,
    verify_token: String,
    base_url: String,
}

impl WhatsAppClient {
    /// Creates a client for the given Graph API version and credentials.
    pub fn new(
        api_token: impl Into<String>,
        phone_number_id: impl Into<String>,
        verify_token: impl Into<String>,
        api_version: &str,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_token: api_token.into(),
            phone_number_id: phone_number_id.into(),
            verify_token: verify_token.into(),
            base_url: format!("https://graph.facebook.com/{}", api_version),
        }
    }

    /// Overrides the Graph API base URL (tests point this at a stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.base_url, self.phone_number_id)
    }

    async fn post_message(&self, payload: serde_json::Value) -> Result<serde_json::Value, anyhow::Error> {
        let response = self
            .client
            .post(self.messages_url())
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("WhatsApp API error ({}): {}", status, error_text));
        }

        Ok(response.json().await?)
    }

    /// Sends a text message, splitting bodies longer than the platform limit
    /// into multiple messages in order.
    pub async fn send_text(&self, to: &str, message: &str) -> Result<(), anyhow::Error> {
        for part in split_message(message) {
            let result = self
                .post_message(json!({
                    "messaging_product": "whatsapp",
                    "recipient_type": "individual",
                    "to": to,
                    "type": "text",
                    "text": { "preview_url": false, "body": part },
                }))
                .await?;

            let message_id = result
                .get("messages")
                .and_then(|m| m.get(0))
                .and_then(|m| m.get("id"))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            info!(to, message_id, "whatsapp message sent");
        }
        Ok(())
    }

    /// Sends an emoji reaction to a message.
    pub async fn send_reaction(
        &self,
        to: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), anyhow::Error> {
        self.post_message(json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "reaction",
            "reaction": { "message_id": message_id, "emoji": emoji },
        }))
        .await?;
        Ok(())
    }

    /// Marks a message as read. Failures are only logged; read receipts are
    /// not worth failing a pipeline over.
    pub async fn mark_as_read(&self, message_id: &str) {
        let result = self
            .post_message(json!({
                "messaging_product": "whatsapp",
                "status": "read",
                "message_id": message_id,
            }))
            .await;

        match result {
            Ok(_) => debug!(message_id, "message marked read"),
            Err(e) => warn!(message_id, error = %e, "mark-as-read failed"),
        }
    }

    /// Downloads media by id: resolve the media URL, then fetch the bytes.
    pub async fn download_media(&self, media_id: &str) -> Result<Vec<u8>, anyhow::Error> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, media_id))
            .header("Authorization", format!("Bearer {}", self.api_token))
            .send()
            .await?
            .error_for_status()?;

        let media_info: serde_json::Value = response.json().await?;
        let media_url = media_info
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Media info has no url"))?;

        let media_response = self
            .client
            .get(media_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .timeout(std::time::Duration::from_secs(60))
            .send()
            .await?
            .error_for_status()?;

        let bytes = media_response.bytes().await?.to_vec();
        info!(media_id, size = bytes.len(), "media downloaded");
        Ok(bytes)
    }

    /// Webhook verification handshake: echoes the challenge when the mode is
    /// `subscribe` and the token matches the configured secret.
    pub fn verify_webhook<'a>(
        &self,
        mode: &str,
        token: &str,
        challenge: &'a str,
    ) -> Option<&'a str> {
        if mode == "subscribe" && token == self.verify_token {
            info!("webhook verified");
            Some(challenge)
        } else {
            warn!(mode, "webhook verification failed");
            None
        }
    }
}

/// Splits a message into platform-sized parts, preserving order. Cuts land
/// on char boundaries; a short message passes through untouched.
fn split_message(message: &str) -> Vec<&str> {
    if message.len() <= MAX_MESSAGE_LEN {
        return vec![message];
    }

    let mut parts = Vec::new();
    let mut rest = message;
    while rest.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        parts.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        parts.push(rest);
    }
    parts
}
