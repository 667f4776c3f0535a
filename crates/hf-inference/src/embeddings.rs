//! `EmbeddingService` over the HF feature-extraction pipeline.
//!
//! The pipeline has no batch endpoint that guarantees stable ordering across
//! models, so `embed_batch` loops per item; order is preserved by
//! construction. Each response is collapsed to rank 1 by
//! [`normalize_embedding`](crate::normalize_embedding).

use crate::{normalize, retry, HfClient};
use async_trait::async_trait;
use embedding::EmbeddingService;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
}

impl HfClient {
    async fn feature_extraction(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        let url = self.model_url(self.embedding_model());

        let body = retry::with_backoff("feature_extraction", || async {
            let response = self
                .http()
                .post(&url)
                .header("Authorization", self.bearer())
                .json(&FeatureExtractionRequest { inputs: text })
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                return Err(anyhow::anyhow!("HF API error ({}): {}", status, error_text));
            }

            Ok(response.json::<serde_json::Value>().await?)
        })
        .await?;

        normalize::normalize_embedding(&body)
    }
}

#[async_trait]
impl EmbeddingService for HfClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        info!(
            model = %self.embedding_model(),
            text_len = text.len(),
            "hf embed request"
        );

        let embedding = self.feature_extraction(text).await?;

        debug!(dimension = embedding.len(), "hf embed done");
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        info!(
            model = %self.embedding_model(),
            batch_size = texts.len(),
            "hf embed_batch request"
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.feature_extraction(text).await?);
        }

        let dimension = embeddings.first().map(|v| v.len()).unwrap_or(0);
        debug!(count = embeddings.len(), dimension, "hf embed_batch done");
        Ok(embeddings)
    }
}
