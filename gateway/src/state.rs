//! Application state: the composition root.

use crate::config::Config;
use crate::processor::MultiModalProcessor;
use embedding::EmbeddingService;
use hf_inference::{HfClient, HfModels};
use memory::ConversationMemory;
use rag::RagEngine;
use std::sync::Arc;
use tokio::sync::Semaphore;
use vector_store::{ChromaStore, VectorStore};
use whatsapp::WhatsAppClient;

/// Shared per-request state. Cheap to clone; everything inside is `Arc`ed.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<MultiModalProcessor>,
    pub rag: Arc<RagEngine>,
    pub memory: ConversationMemory,
    pub whatsapp: Arc<WhatsAppClient>,
    /// Caps concurrent webhook background workers.
    pub webhook_permits: Arc<Semaphore>,
}

impl AppState {
    /// Builds every service once and wires them together. The HF client
    /// backs all four model traits; the processor and routes only see the
    /// trait objects.
    pub fn from_config(config: &Config) -> Self {
        let models = HfModels {
            chat: config.hf_chat_model.clone(),
            embedding: config.hf_embedding_model.clone(),
            whisper: config.hf_whisper_model.clone(),
            vision: config.hf_vision_model.clone(),
        };

        let mut hf = HfClient::new(config.hf_api_token.clone(), models);
        if let Some(base_url) = &config.hf_base_url {
            hf = hf.with_base_url(base_url.clone());
        }
        let hf = Arc::new(hf);

        let embeddings: Arc<dyn EmbeddingService> = hf.clone();
        let store: Arc<dyn VectorStore> = Arc::new(ChromaStore::new(
            &config.chroma_host,
            config.chroma_port,
            config.chroma_collection_name.clone(),
        ));

        let rag = Arc::new(RagEngine::new(
            store,
            embeddings,
            config.rag_chunk_size,
            config.rag_chunk_overlap,
            config.rag_top_k,
            config.chroma_collection_name.clone(),
        ));

        let memory = ConversationMemory::new(
            config.max_conversation_history,
            chrono::Duration::hours(config.conversation_ttl_hours),
        );

        let whatsapp = Arc::new(WhatsAppClient::new(
            config.whatsapp_api_token.clone(),
            config.whatsapp_phone_number_id.clone(),
            config.whatsapp_verify_token.clone(),
            &config.whatsapp_api_version,
        ));

        let processor = Arc::new(MultiModalProcessor::new(
            hf.clone(),
            hf.clone(),
            hf,
            rag.clone(),
            memory.clone(),
        ));

        Self {
            processor,
            rag,
            memory,
            whatsapp,
            webhook_permits: Arc::new(Semaphore::new(config.webhook_concurrency)),
        }
    }
}
