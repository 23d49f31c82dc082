use crate::llm::openai::build_client;
use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;
use pdfchat_vector::{Embedder, Error as VectorError, Result};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Embedding provider backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// Inputs larger than `batch_size` are sent as several sequential requests.
/// The call as a whole still fails if any sub-request fails, and nothing is
/// returned until every sub-request has succeeded.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    batch_size: usize,
    timeout: Duration,
}

impl OpenAIEmbedder {
    pub fn new(
        api_key: &str,
        api_base: &str,
        model: impl Into<String>,
        batch_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            client: build_client(api_key, api_base),
            model: model.into(),
            batch_size: batch_size.max(1),
            timeout,
        }
    }

    async fn embed_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()
            .map_err(|e| VectorError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = timeout(self.timeout, self.client.embeddings().create(request))
            .await
            .map_err(|_| {
                VectorError::Timeout(format!("no response within {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| VectorError::Embedding(format!("OpenAI API error: {}", e)))?;

        let mut data = response.data;
        if data.len() != texts.len() {
            return Err(VectorError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }

        // The API does not promise response order
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!(model = %self.model, batch = batch.len(), "Requesting embeddings");
            embeddings.extend(self.embed_request(batch).await?);
        }

        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
