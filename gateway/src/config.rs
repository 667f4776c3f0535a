//! Environment-sourced configuration.
//!
//! Every knob has a default so a bare `.env` with just the API tokens is
//! enough to run. `HF_API_TOKEN` is the only required value.

use anyhow::Result;
use std::env;
use std::str::FromStr;

/// Full gateway configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // HuggingFace Inference API
    pub hf_api_token: String,
    pub hf_chat_model: String,
    pub hf_embedding_model: String,
    pub hf_whisper_model: String,
    pub hf_vision_model: String,
    /// Override for the API base URL; tests point this at a stub.
    pub hf_base_url: Option<String>,

    // WhatsApp Business Cloud API
    pub whatsapp_api_token: String,
    pub whatsapp_phone_number_id: String,
    pub whatsapp_verify_token: String,
    pub whatsapp_api_version: String,
    /// Maximum webhook messages processed concurrently.
    pub webhook_concurrency: usize,

    // Chroma vector store
    pub chroma_host: String,
    pub chroma_port: u16,
    pub chroma_collection_name: String,

    // RAG tuning
    pub rag_chunk_size: usize,
    pub rag_chunk_overlap: usize,
    pub rag_top_k: usize,

    // Conversation memory
    pub max_conversation_history: usize,
    pub conversation_ttl_hours: i64,

    // HTTP server
    pub app_host: String,
    pub app_port: u16,
}

impl Config {
    /// Loads configuration from the environment. Fails only when
    /// `HF_API_TOKEN` is missing or a numeric value does not parse.
    pub fn from_env() -> Result<Self> {
        let hf_api_token = env::var("HF_API_TOKEN")
            .map_err(|_| anyhow::anyhow!("HF_API_TOKEN not set"))?;

        Ok(Self {
            hf_api_token,
            hf_chat_model: env_or("HF_CHAT_MODEL", "mistralai/Mistral-7B-Instruct-v0.3"),
            hf_embedding_model: env_or(
                "HF_EMBEDDING_MODEL",
                "sentence-transformers/all-MiniLM-L6-v2",
            ),
            hf_whisper_model: env_or("HF_WHISPER_MODEL", "openai/whisper-large-v3"),
            hf_vision_model: env_or("HF_VISION_MODEL", "Salesforce/blip-image-captioning-large"),
            hf_base_url: env::var("HF_BASE_URL").ok(),

            whatsapp_api_token: env_or("WHATSAPP_API_TOKEN", ""),
            whatsapp_phone_number_id: env_or("WHATSAPP_PHONE_NUMBER_ID", ""),
            whatsapp_verify_token: env_or("WHATSAPP_VERIFY_TOKEN", "multisense-verify-token"),
            whatsapp_api_version: env_or("WHATSAPP_API_VERSION", "v21.0"),
            webhook_concurrency: env_parse("WEBHOOK_CONCURRENCY", 8)?,

            chroma_host: env_or("CHROMA_HOST", "localhost"),
            chroma_port: env_parse("CHROMA_PORT", 8000)?,
            chroma_collection_name: env_or("CHROMA_COLLECTION_NAME", "multisense_documents"),

            rag_chunk_size: env_parse("RAG_CHUNK_SIZE", 1000)?,
            rag_chunk_overlap: env_parse("RAG_CHUNK_OVERLAP", 200)?,
            rag_top_k: env_parse("RAG_TOP_K", 5)?,

            // A zero limit would drop the turn being processed; floor at one.
            max_conversation_history: env_parse::<usize>("MAX_CONVERSATION_HISTORY", 20)?.max(1),
            conversation_ttl_hours: env_parse("CONVERSATION_TTL_HOURS", 24)?,

            app_host: env_or("APP_HOST", "0.0.0.0"),
            app_port: env_parse("APP_PORT", 8080)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Default for Config {
    /// Test configuration: defaults everywhere, empty tokens.
    fn default() -> Self {
        Self {
            hf_api_token: String::new(),
            hf_chat_model: "mistralai/Mistral-7B-Instruct-v0.3".to_string(),
            hf_embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            hf_whisper_model: "openai/whisper-large-v3".to_string(),
            hf_vision_model: "Salesforce/blip-image-captioning-large".to_string(),
            hf_base_url: None,
            whatsapp_api_token: String::new(),
            whatsapp_phone_number_id: String::new(),
            whatsapp_verify_token: "multisense-verify-token".to_string(),
            whatsapp_api_version: "v21.0".to_string(),
            webhook_concurrency: 8,
            chroma_host: "localhost".to_string(),
            chroma_port: 8000,
            chroma_collection_name: "multisense_documents".to_string(),
            rag_chunk_size: 1000,
            rag_chunk_overlap: 200,
            rag_top_k: 5,
            max_conversation_history: 20,
            conversation_ttl_hours: 24,
            app_host: "0.0.0.0".to_string(),
            app_port: 8080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_uses_default_when_unset() {
        let value: usize = env_parse("GATEWAY_TEST_SURELY_UNSET", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn history_limit_is_clamped_to_at_least_one() {
        env::set_var("HF_API_TOKEN", "test-token");
        env::set_var("MAX_CONVERSATION_HISTORY", "0");

        let config = Config::from_env().unwrap();
        assert_eq!(config.max_conversation_history, 1);

        env::remove_var("MAX_CONVERSATION_HISTORY");
        env::remove_var("HF_API_TOKEN");
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.rag_chunk_size, 1000);
        assert_eq!(config.rag_chunk_overlap, 200);
        assert_eq!(config.rag_top_k, 5);
        assert_eq!(config.conversation_ttl_hours, 24);
        assert_eq!(config.app_port, 8080);
    }
}
