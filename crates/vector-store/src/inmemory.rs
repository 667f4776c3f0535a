//! In-memory vector store for tests and development.
//!
//! Brute-force cosine ranking over a HashMap of chunks. Data is lost on
//! restart; thread safety via `Arc<RwLock<..>>`.

use crate::{DocumentChunk, ScoredChunk, VectorStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredChunk {
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

/// In-memory implementation of [`VectorStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorStore {
    entries: Arc<RwLock<HashMap<String, StoredChunk>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks currently stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), anyhow::Error> {
        if chunks.len() != embeddings.len() {
            anyhow::bail!(
                "Chunk/embedding count mismatch: {} vs {}",
                chunks.len(),
                embeddings.len()
            );
        }

        let mut entries = self.entries.write().await;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            entries.insert(
                chunk.id.clone(),
                StoredChunk {
                    chunk: chunk.clone(),
                    embedding: embedding.clone(),
                },
            );
        }
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, anyhow::Error> {
        let entries = self.entries.read().await;

        let mut scored: Vec<(f32, &StoredChunk)> = entries
            .values()
            .map(|stored| {
                (
                    Self::cosine_similarity(embedding, &stored.embedding),
                    stored,
                )
            })
            .collect();

        // Cosine distance = 1 - similarity; closest first.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(similarity, stored)| ScoredChunk {
                text: stored.chunk.text.clone(),
                source: stored.chunk.source.clone(),
                chunk_index: stored.chunk.chunk_index,
                distance: 1.0 - similarity,
            })
            .collect())
    }

    async fn delete_by_source(&self, source: &str) -> Result<(), anyhow::Error> {
        let mut entries = self.entries.write().await;
        entries.retain(|_, stored| stored.chunk.source != source);
        Ok(())
    }

    async fn count(&self) -> Result<usize, anyhow::Error> {
        Ok(self.len().await)
    }
}
