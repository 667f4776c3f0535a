//! # Vector Store
//!
//! This crate defines the vector index interface used by the RAG engine and
//! two implementations:
//!
//! - [`ChromaStore`]: HTTP adapter for a remote Chroma collection, cosine
//!   distance space.
//! - [`InMemoryVectorStore`]: brute-force cosine ranking in process, for
//!   tests and development.
//!
//! Chunks are stored wholesale: re-upserting an id overwrites the previous
//! record. Embedding dimensionality is not validated here; a mismatch fails
//! at the index boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod chroma;
mod inmemory;

pub use chroma::ChromaStore;
pub use inmemory::InMemoryVectorStore;

/// One chunk of an ingested document, as persisted in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Deterministic id: filename-hash prefix + `_chunk_` + index.
    pub id: String,
    /// Chunk text content.
    pub text: String,
    /// Source filename the chunk was cut from.
    pub source: String,
    /// Position of this chunk within the document, from 0.
    pub chunk_index: usize,
    /// Number of chunks the document was cut into.
    pub total_chunks: usize,
    /// Caller-supplied extra metadata, stored alongside the standard fields.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A query hit: chunk payload plus its cosine distance to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
    pub distance: f32,
}

/// Best-effort collection statistics for health and introspection endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection_name: String,
    pub document_count: usize,
    pub status: String,
}

/// Interface to a vector index keyed by cosine distance.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upserts chunks and their embeddings in one batch. `chunks[i]` pairs
    /// with `embeddings[i]`; existing ids are overwritten.
    async fn upsert(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), anyhow::Error>;

    /// Returns the `top_k` nearest chunks to `embedding`, closest first.
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, anyhow::Error>;

    /// Deletes every chunk whose `source` metadata equals `source`.
    async fn delete_by_source(&self, source: &str) -> Result<(), anyhow::Error>;

    /// Returns the number of chunks in the collection.
    async fn count(&self) -> Result<usize, anyhow::Error>;
}
