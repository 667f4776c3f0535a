//! # Text Embeddings
//!
//! Defines the embedding service interface used by the RAG pipeline.
//! Implementations turn text into fixed-dimensionality float vectors;
//! the dimensionality is a property of the backing model and must be
//! consistent across all texts embedded for the same collection.

use async_trait::async_trait;

/// Service for generating text embeddings.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generates an embedding vector for a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error>;

    /// Generates embedding vectors for multiple texts.
    ///
    /// Order is preserved: output `i` corresponds to input `i`. Implementations
    /// may batch or loop per item, but must keep this correspondence.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error>;
}
