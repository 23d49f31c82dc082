//! Embedding provider interface consumed by the store.

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Maps text to embedding vectors.
///
/// Implementations talk to a remote service; the store only relies on the
/// ordering contract: `embed_batch` returns exactly one vector per input, in
/// input order, or fails as a whole.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts in one logical call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("Provider returned no embedding".to_string()))
    }

    /// Identifier of the embedding model.
    fn model_name(&self) -> &str;
}
