//! # Inference interfaces
//!
//! Chat message types plus the traits the processor talks to: chat
//! completion, speech-to-text, and image captioning. Transport-agnostic;
//! implemented by `hf-inference`, faked in tests.
//!
//! ## External interactions
//!
//! - **Model APIs**: implementations call remote inference endpoints
//!   (chat LLM, ASR, image-to-text). This crate itself performs no I/O.

use async_trait::async_trait;

/// Role of a chat message, one-to-one with the Chat Completions `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message, one element of a Chat Completions `messages` array.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// System instruction sent with every chat completion.
pub const SYSTEM_PROMPT: &str = "You are MultiSense Agent, an intelligent multi-modal AI assistant. You can:\n\
- Answer questions based on your knowledge\n\
- Analyze images and describe what you see\n\
- Transcribe and respond to voice messages\n\
- Extract information from PDF documents using RAG (Retrieval Augmented Generation)\n\
- Maintain conversation context across messages\n\n\
Guidelines:\n\
- Be helpful, accurate, and concise\n\
- When answering from document context, cite the source\n\
- If you don't know something, say so honestly\n\
- For image analysis, be detailed and descriptive\n\
- Format responses clearly with bullet points or paragraphs as appropriate\n\
- Keep responses under 1500 characters when possible (WhatsApp message limit friendly)";

/// Chat completion interface: returns the model reply for a message list.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends `messages` (system prompt included by the caller) and returns the
    /// generated reply text.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, anyhow::Error>;
}

/// Speech-to-text interface.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribes raw audio bytes to text.
    async fn transcribe(&self, audio: &[u8]) -> Result<String, anyhow::Error>;
}

/// Image captioning interface.
#[async_trait]
pub trait VisionCaptioner: Send + Sync {
    /// Produces a descriptive caption for raw image bytes.
    async fn caption(&self, image: &[u8]) -> Result<String, anyhow::Error>;
}
