//! Multi-modal orchestration.
//!
//! Routes each input modality to its pipeline:
//!
//! - text: RAG context retrieval, then chat completion with history
//! - voice: speech-to-text, then the text pipeline
//! - image: captioning, optionally refined by the chat model
//! - document: PDF ingestion into the knowledge base
//!
//! All model services are trait objects, injected at construction.

use inference::{ChatMessage, ChatModel, MessageRole, SpeechToText, VisionCaptioner, SYSTEM_PROMPT};
use memory::{ConversationMemory, MessageType, TurnRole};
use rag::RagEngine;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Prompts that mean "just describe the image"; anything else is treated as
/// a user question and gets a chat-model follow-up.
const DEFAULT_IMAGE_PROMPTS: [&str; 2] = [
    "Describe this image in detail. What do you see?",
    "Analyze this image in detail. Describe what you see, any text visible, and any notable elements.",
];

/// Uniform response envelope for every modality.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub sources: Vec<String>,
    /// Seconds, rounded to two decimals.
    pub processing_time: f64,
    pub message_type: MessageType,
}

/// Central processor orchestrating model services, retrieval, and memory.
pub struct MultiModalProcessor {
    chat: Arc<dyn ChatModel>,
    stt: Arc<dyn SpeechToText>,
    vision: Arc<dyn VisionCaptioner>,
    rag: Arc<RagEngine>,
    memory: ConversationMemory,
}

impl MultiModalProcessor {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        stt: Arc<dyn SpeechToText>,
        vision: Arc<dyn VisionCaptioner>,
        rag: Arc<RagEngine>,
        memory: ConversationMemory,
    ) -> Self {
        Self {
            chat,
            stt,
            vision,
            rag,
            memory,
        }
    }

    /// Text pipeline: record the turn, optionally retrieve document context,
    /// complete with the full session history, record the reply.
    ///
    /// Retrieval degradation is not an error here; the chat proceeds without
    /// context when the store is unreachable.
    pub async fn process_text(
        &self,
        text: &str,
        session_id: &str,
        use_rag: bool,
    ) -> Result<ChatResponse, anyhow::Error> {
        let start = Instant::now();

        self.memory
            .add_turn(session_id, TurnRole::User, text, MessageType::Text)
            .await;

        let mut augmented_prompt = text.to_string();
        let mut sources = Vec::new();
        if use_rag {
            let (context, found_sources) = self.rag.retrieve(text, None).await.into_parts();
            if !context.is_empty() {
                info!(sources = ?found_sources, context_length = context.len(), "rag context applied");
                augmented_prompt = format!(
                    "Use the following context to answer the user's question. \
                     If the context is not relevant, answer from your general knowledge.\n\n\
                     --- Retrieved Context ---\n{}\n--- End Context ---\n\n\
                     User Question: {}",
                    context, text
                );
                sources = found_sources;
            }
        }

        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
        messages.extend(self.memory.chat_messages(session_id).await);
        // The last entry is the turn recorded above; swap in the augmented
        // prompt so the context reaches the model but not the history. The
        // role check keeps a truncated-away turn from clobbering the system
        // prompt.
        if let Some(last) = messages.last_mut() {
            if last.role == MessageRole::User {
                last.content = augmented_prompt;
            }
        }

        let response = self.chat.complete(messages).await?;

        self.memory
            .add_turn(session_id, TurnRole::Assistant, &response, MessageType::Text)
            .await;

        let elapsed = start.elapsed().as_secs_f64();
        info!(session_id, elapsed = round2(elapsed), "text processed");

        Ok(ChatResponse {
            response,
            session_id: session_id.to_string(),
            sources,
            processing_time: round2(elapsed),
            message_type: MessageType::Text,
        })
    }

    /// Voice pipeline: transcribe, then run the text pipeline and prefix the
    /// reply with the transcription.
    pub async fn process_voice(
        &self,
        audio: &[u8],
        session_id: &str,
    ) -> Result<ChatResponse, anyhow::Error> {
        let start = Instant::now();

        let transcription = self.stt.transcribe(audio).await?;
        info!(session_id, text_length = transcription.len(), "voice transcribed");

        let mut result = self.process_text(&transcription, session_id, true).await?;
        result.response = format!(
            "🎤 *Transcription:* _{}_\n\n{}",
            transcription, result.response
        );
        result.message_type = MessageType::Voice;
        result.processing_time = round2(start.elapsed().as_secs_f64());

        Ok(result)
    }

    /// Image pipeline: caption the image; when the caller asked a specific
    /// question, let the chat model answer it from the caption.
    pub async fn process_image(
        &self,
        image: &[u8],
        session_id: &str,
        caption: Option<&str>,
    ) -> Result<ChatResponse, anyhow::Error> {
        let start = Instant::now();

        let prompt = caption.unwrap_or(DEFAULT_IMAGE_PROMPTS[1]);
        let description = self.vision.caption(image).await?;

        let analysis = if DEFAULT_IMAGE_PROMPTS.contains(&prompt) {
            description
        } else {
            let question = format!(
                "I have an image that was analyzed by a vision model. \
                 The vision model described it as: \"{}\"\n\n\
                 Based on this description, please answer the user's question: {}",
                description, prompt
            );
            let enhanced = self.chat.complete(vec![ChatMessage::user(question)]).await?;
            format!(
                "**Image Description:** {}\n\n**Analysis:** {}",
                description, enhanced
            )
        };

        self.memory
            .add_turn(
                session_id,
                TurnRole::User,
                format!("[Image sent] {}", caption.unwrap_or("Image analysis requested")),
                MessageType::Image,
            )
            .await;
        self.memory
            .add_turn(session_id, TurnRole::Assistant, &analysis, MessageType::Image)
            .await;

        let elapsed = start.elapsed().as_secs_f64();
        info!(session_id, elapsed = round2(elapsed), "image processed");

        Ok(ChatResponse {
            response: format!("📸 *Image Analysis:*\n\n{}", analysis),
            session_id: session_id.to_string(),
            sources: vec![],
            processing_time: round2(elapsed),
            message_type: MessageType::Image,
        })
    }

    /// Document pipeline: PDFs go into the knowledge base; anything else gets
    /// a polite refusal naming the received type.
    pub async fn process_document(
        &self,
        data: &[u8],
        session_id: &str,
        filename: &str,
        mime_type: Option<&str>,
    ) -> Result<ChatResponse, anyhow::Error> {
        let start = Instant::now();

        let is_pdf = mime_type.is_some_and(|m| m.to_lowercase().contains("pdf"))
            || filename.to_lowercase().ends_with(".pdf");

        let response_text = if is_pdf {
            let chunks = self.rag.ingest_pdf(data, filename).await?;
            format!(
                "📄 *Document Processed:* _{}_\n\n\
                 ✅ Successfully ingested into knowledge base.\n\
                 📊 Created *{}* searchable chunks.\n\n\
                 You can now ask me questions about this document!",
                filename, chunks
            )
        } else {
            format!(
                "⚠️ Currently, I only support PDF documents for RAG ingestion.\n\
                 Received: {}\n\n\
                 Please send a PDF file to add it to my knowledge base.",
                mime_type.unwrap_or("unknown type")
            )
        };

        self.memory
            .add_turn(
                session_id,
                TurnRole::User,
                format!("[Document sent: {}]", filename),
                MessageType::Document,
            )
            .await;
        self.memory
            .add_turn(
                session_id,
                TurnRole::Assistant,
                &response_text,
                MessageType::Document,
            )
            .await;

        Ok(ChatResponse {
            response: response_text,
            session_id: session_id.to_string(),
            sources: vec![filename.to_string()],
            processing_time: round2(start.elapsed().as_secs_f64()),
            message_type: MessageType::Document,
        })
    }
}

fn round2(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}
