//! Ingestion and retrieval orchestration.

use crate::splitter::TextSplitter;
use embedding::EmbeddingService;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vector_store::{CollectionStats, DocumentChunk, VectorStore};

/// Separator placed between retrieved chunks in the merged context.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Outcome of a retrieval. Degradation is explicit so callers and logs can
/// tell "nothing matched" apart from "the store was unreachable"; both mean
/// the chat proceeds without document context.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// Matching chunks were found. `sources` holds distinct source filenames
    /// in order of first appearance.
    Found {
        context: String,
        sources: Vec<String>,
    },
    /// The collection had no matches.
    Empty,
    /// The store or embedding call failed; `reason` is already logged.
    Degraded { reason: String },
}

impl Retrieval {
    /// Context and sources for prompt assembly; empty on Empty/Degraded.
    pub fn into_parts(self) -> (String, Vec<String>) {
        match self {
            Retrieval::Found { context, sources } => (context, sources),
            _ => (String::new(), vec![]),
        }
    }
}

/// Retrieval augmented generation engine.
///
/// Owns the chunking configuration and orchestrates the embedding service
/// and the vector store; both are injected so tests can substitute fakes.
pub struct RagEngine {
    store: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingService>,
    splitter: TextSplitter,
    collection_name: String,
    top_k: usize,
}

impl RagEngine {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embeddings: Arc<dyn EmbeddingService>,
        chunk_size: usize,
        chunk_overlap: usize,
        top_k: usize,
        collection_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embeddings,
            splitter: TextSplitter::new(chunk_size, chunk_overlap),
            collection_name: collection_name.into(),
            top_k,
        }
    }

    /// Ingests a document: split into chunks, embed, and upsert in one batch.
    ///
    /// Chunk ids are deterministic (`hash(filename)[..8]_chunk_{i}`), so
    /// re-ingesting the same filename overwrites its chunks. Prior chunks of
    /// the same source are deleted first so a shrinking document leaves no
    /// stale entries behind.
    ///
    /// Returns the number of chunks created; whitespace-only content is a
    /// no-op returning 0.
    pub async fn ingest(
        &self,
        content: &str,
        filename: &str,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Result<usize, anyhow::Error> {
        if content.trim().is_empty() {
            warn!(filename, "ingest skipped: empty content");
            return Ok(0);
        }

        let texts = self.splitter.split(content);
        info!(filename, chunk_count = texts.len(), "document chunked");

        if texts.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embeddings.embed_batch(&texts).await?;

        let id_prefix = filename_hash(filename);
        let total = texts.len();
        let chunks: Vec<DocumentChunk> = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| DocumentChunk {
                id: format!("{}_chunk_{}", id_prefix, i),
                text,
                source: filename.to_string(),
                chunk_index: i,
                total_chunks: total,
                extra: extra.clone(),
            })
            .collect();

        self.store.delete_by_source(filename).await?;
        self.store.upsert(&chunks, &embeddings).await?;

        info!(
            filename,
            chunks = total,
            collection = %self.collection_name,
            "document ingested"
        );
        Ok(total)
    }

    /// Extracts text from a PDF and ingests it with `type = pdf` metadata.
    pub async fn ingest_pdf(
        &self,
        pdf_data: &[u8],
        filename: &str,
    ) -> Result<usize, anyhow::Error> {
        let text = crate::pdf::extract_pdf_text(pdf_data).await?;
        if text.trim().is_empty() {
            warn!(filename, "pdf has no extractable text");
            return Ok(0);
        }

        let mut extra = serde_json::Map::new();
        extra.insert("type".into(), serde_json::Value::String("pdf".into()));
        self.ingest(&text, filename, extra).await
    }

    /// Retrieves context for a query: embed, nearest-neighbor search, merge.
    ///
    /// Failures degrade rather than propagate; a vector-store outage must
    /// never block chat responses.
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Retrieval {
        let k = top_k.unwrap_or(self.top_k);

        let result: Result<Retrieval, anyhow::Error> = async {
            let query_embedding = self.embeddings.embed(query).await?;
            let hits = self.store.query(&query_embedding, k).await?;

            if hits.is_empty() {
                info!(query_preview = preview(query), "rag: no results");
                return Ok(Retrieval::Empty);
            }

            let mut context_parts = Vec::with_capacity(hits.len());
            let mut sources: Vec<String> = Vec::new();
            for hit in &hits {
                debug!(
                    source = %hit.source,
                    chunk = hit.chunk_index,
                    distance = hit.distance,
                    "rag result"
                );
                context_parts.push(hit.text.as_str());
                if !sources.iter().any(|s| s == &hit.source) {
                    sources.push(hit.source.clone());
                }
            }

            info!(chunks = hits.len(), sources = ?sources, "rag context retrieved");
            Ok(Retrieval::Found {
                context: context_parts.join(CONTEXT_SEPARATOR),
                sources,
            })
        }
        .await;

        match result {
            Ok(retrieval) => retrieval,
            Err(e) => {
                error!(error = %e, "rag retrieval degraded");
                Retrieval::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Best-effort collection statistics; errors land in `status` instead of
    /// propagating.
    pub async fn stats(&self) -> CollectionStats {
        match self.store.count().await {
            Ok(count) => CollectionStats {
                collection_name: self.collection_name.clone(),
                document_count: count,
                status: "connected".to_string(),
            },
            Err(e) => CollectionStats {
                collection_name: self.collection_name.clone(),
                document_count: 0,
                status: format!("error: {}", e),
            },
        }
    }
}

/// First 8 hex chars of the filename's SHA-256, the stable id prefix for all
/// chunks of that file.
fn filename_hash(filename: &str) -> String {
    let digest = Sha256::digest(filename.as_bytes());
    format!("{:x}", digest)[..8].to_string()
}

fn preview(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(100)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}
