//! HTTP adapter for a remote Chroma collection.
//!
//! ## External interactions
//!
//! - **Chroma REST API**: `POST /api/v1/collections` (get-or-create),
//!   `/upsert`, `/query`, `/delete`, `GET /count` under the collection id.
//! - The collection is created with `hnsw:space = cosine`, so query
//!   distances are cosine distances (lower is closer).

use crate::{DocumentChunk, ScoredChunk, VectorStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Chroma vector store client. The collection id is resolved lazily on first
/// use and cached for the lifetime of the client.
#[derive(Debug)]
pub struct ChromaStore {
    client: reqwest::Client,
    base_url: String,
    collection_name: String,
    collection_id: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct Collection {
    id: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    documents: Vec<Vec<String>>,
    metadatas: Vec<Vec<serde_json::Map<String, serde_json::Value>>>,
    distances: Vec<Vec<f32>>,
}

impl ChromaStore {
    /// Creates a client for `http://{host}:{port}` and the named collection.
    pub fn new(host: &str, port: u16, collection_name: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("http://{}:{}/api/v1", host, port),
            collection_name: collection_name.into(),
            collection_id: OnceCell::new(),
        }
    }

    /// Creates a client from a full base URL (tests point this at a stub).
    pub fn with_base_url(base_url: impl Into<String>, collection_name: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            collection_name: collection_name.into(),
            collection_id: OnceCell::new(),
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Resolves the collection id, creating the collection if absent.
    async fn collection_id(&self) -> Result<&str, anyhow::Error> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .post(format!("{}/collections", self.base_url))
                    .json(&json!({
                        "name": self.collection_name,
                        "metadata": { "hnsw:space": "cosine" },
                        "get_or_create": true,
                    }))
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(anyhow::anyhow!(
                        "Chroma collection error ({}): {}",
                        status,
                        error_text
                    ));
                }

                let collection: Collection = response.json().await?;
                info!(
                    collection = %self.collection_name,
                    id = %collection.id,
                    "chroma collection resolved"
                );
                Ok::<_, anyhow::Error>(collection.id)
            })
            .await?;

        Ok(id)
    }

    async fn post_op(&self, op: &str, body: serde_json::Value) -> Result<reqwest::Response, anyhow::Error> {
        let id = self.collection_id().await?;
        let response = self
            .client
            .post(format!("{}/collections/{}/{}", self.base_url, id, op))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Chroma {} error ({}): {}", op, status, error_text));
        }

        Ok(response)
    }

    fn chunk_metadata(chunk: &DocumentChunk) -> serde_json::Value {
        let mut meta = serde_json::Map::new();
        meta.insert("source".into(), json!(chunk.source));
        meta.insert("chunk_index".into(), json!(chunk.chunk_index));
        meta.insert("total_chunks".into(), json!(chunk.total_chunks));
        for (k, v) in &chunk.extra {
            meta.insert(k.clone(), v.clone());
        }
        serde_json::Value::Object(meta)
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
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
        if chunks.is_empty() {
            return Ok(());
        }

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        let documents: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let metadatas: Vec<serde_json::Value> = chunks.iter().map(Self::chunk_metadata).collect();

        self.post_op(
            "upsert",
            json!({
                "ids": ids,
                "embeddings": embeddings,
                "documents": documents,
                "metadatas": metadatas,
            }),
        )
        .await?;

        debug!(count = chunks.len(), "chroma upsert done");
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, anyhow::Error> {
        let response = self
            .post_op(
                "query",
                json!({
                    "query_embeddings": [embedding],
                    "n_results": top_k,
                    "include": ["documents", "metadatas", "distances"],
                }),
            )
            .await?;

        let body: QueryResponse = response.json().await?;

        let (documents, metadatas, distances) = match (
            body.documents.into_iter().next(),
            body.metadatas.into_iter().next(),
            body.distances.into_iter().next(),
        ) {
            (Some(d), Some(m), Some(s)) => (d, m, s),
            _ => return Ok(vec![]),
        };

        let hits = documents
            .into_iter()
            .zip(metadatas)
            .zip(distances)
            .map(|((text, meta), distance)| ScoredChunk {
                text,
                source: meta
                    .get("source")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                chunk_index: meta
                    .get("chunk_index")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as usize,
                distance,
            })
            .collect();

        Ok(hits)
    }

    async fn delete_by_source(&self, source: &str) -> Result<(), anyhow::Error> {
        self.post_op("delete", json!({ "where": { "source": source } }))
            .await?;
        debug!(source, "chroma delete-by-source done");
        Ok(())
    }

    async fn count(&self) -> Result<usize, anyhow::Error> {
        let id = self.collection_id().await?;
        let response = self
            .client
            .get(format!("{}/collections/{}/count", self.base_url, id))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Chroma count error ({}): {}", status, error_text));
        }

        Ok(response.json::<usize>().await?)
    }
}
