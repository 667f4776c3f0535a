//! # HuggingFace Inference Service
//!
//! This crate implements the model-facing traits over the HuggingFace
//! Inference API (serverless) with open-source models:
//!
//! - Chat: any HF chat model via the OpenAI-compatible completions route
//! - Embeddings: sentence-transformers feature extraction (see [`normalize`])
//! - Audio: Whisper automatic speech recognition
//! - Vision: BLIP-style image captioning
//!
//! ## Retry policy
//!
//! Every call goes through [`retry::with_backoff`]: up to 3 attempts with
//! exponential backoff starting at 2 seconds, capped at 30 seconds. The retry
//! applies to the single API call only; orchestration above never retries.
//!
//! ## Configuration
//!
//! The client needs an API token and per-capability model names. The base URL
//! can be overridden, which tests use to point at a local stub server.

use anyhow::Context;
use async_trait::async_trait;
use inference::{ChatMessage, ChatModel, SpeechToText, VisionCaptioner};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

mod embeddings;
mod normalize;
pub(crate) mod retry;

pub use normalize::normalize_embedding;

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Model names for each capability the gateway uses.
#[derive(Debug, Clone)]
pub struct HfModels {
    pub chat: String,
    pub embedding: String,
    pub whisper: String,
    pub vision: String,
}

impl Default for HfModels {
    fn default() -> Self {
        Self {
            chat: "mistralai/Mistral-7B-Instruct-v0.3".to_string(),
            embedding: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            whisper: "openai/whisper-large-v3".to_string(),
            vision: "Salesforce/blip-image-captioning-large".to_string(),
        }
    }
}

/// HuggingFace Inference API client. One reqwest client, shared by all
/// capabilities; cheap to clone.
#[derive(Debug, Clone)]
pub struct HfClient {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
    models: HfModels,
}

impl HfClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `api_token` - HuggingFace API token. If empty, will try to read from
    ///   the HF_API_TOKEN environment variable.
    /// * `models` - Model names per capability.
    pub fn new(api_token: String, models: HfModels) -> Self {
        let api_token = if api_token.is_empty() {
            std::env::var("HF_API_TOKEN").unwrap_or_default()
        } else {
            api_token
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_token,
            base_url: DEFAULT_BASE_URL.to_string(),
            models,
        }
    }

    /// Overrides the API base URL (e.g. a stub server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Returns the configured chat model name (for diagnostics).
    pub fn chat_model(&self) -> &str {
        &self.models.chat
    }

    pub(crate) fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.api_token)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn embedding_model(&self) -> &str {
        &self.models.embedding
    }

    /// POSTs raw media bytes to a model endpoint and returns the JSON body.
    /// Shared by the ASR and captioning paths, which differ only in the
    /// response shape.
    async fn post_media(&self, model: &str, data: &[u8]) -> Result<serde_json::Value, anyhow::Error> {
        let response = self
            .client
            .post(self.model_url(model))
            .header("Authorization", self.bearer())
            .body(data.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("HF API error ({}): {}", status, error_text));
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl ChatModel for HfClient {
    /// Generates a chat completion via the OpenAI-compatible route that the
    /// HF Inference API exposes per model.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, anyhow::Error> {
        info!(
            model = %self.models.chat,
            message_count = messages.len(),
            "hf chat completion request"
        );

        let url = format!("{}/v1/chat/completions", self.model_url(&self.models.chat));

        let reply = retry::with_backoff("chat_completion", || async {
            let request = ChatCompletionRequest {
                model: &self.models.chat,
                messages: &messages,
                temperature: 0.7,
                max_tokens: 1024,
            };

            let response = self
                .client
                .post(&url)
                .header("Authorization", self.bearer())
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                return Err(anyhow::anyhow!("HF API error ({}): {}", status, error_text));
            }

            let completion: ChatCompletionResponse = response.json().await?;
            completion
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .context("No choices in chat completion response")
        })
        .await?;

        debug!(reply_len = reply.len(), "hf chat completion done");
        Ok(reply)
    }
}

#[async_trait]
impl SpeechToText for HfClient {
    /// Transcribes audio with Whisper. The endpoint answers `{"text": ...}`;
    /// some deployments return a bare string, which is accepted too.
    async fn transcribe(&self, audio: &[u8]) -> Result<String, anyhow::Error> {
        info!(
            model = %self.models.whisper,
            audio_size = audio.len(),
            "hf whisper transcription request"
        );

        let body = retry::with_backoff("transcribe", || async {
            self.post_media(&self.models.whisper, audio).await
        })
        .await?;

        let text = match &body {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(map) => map
                .get("text")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .context("ASR response has no text field")?,
            other => anyhow::bail!("Unexpected ASR response shape: {}", other),
        };

        debug!(text_len = text.len(), "hf transcription done");
        Ok(text)
    }
}

#[async_trait]
impl VisionCaptioner for HfClient {
    /// Captions an image. The image-to-text pipeline answers
    /// `[{"generated_text": ...}]`; object and bare-string shapes are
    /// accepted as well.
    async fn caption(&self, image: &[u8]) -> Result<String, anyhow::Error> {
        info!(
            model = %self.models.vision,
            image_size = image.len(),
            "hf image caption request"
        );

        let body = retry::with_backoff("caption", || async {
            self.post_media(&self.models.vision, image).await
        })
        .await?;

        let caption = match &body {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .first()
                .and_then(|v| v.get("generated_text"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .context("Caption response has no generated_text")?,
            serde_json::Value::Object(map) => map
                .get("generated_text")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .context("Caption response has no generated_text")?,
            other => anyhow::bail!("Unexpected caption response shape: {}", other),
        };

        debug!(caption_len = caption.len(), "hf caption done");
        Ok(caption)
    }
}
