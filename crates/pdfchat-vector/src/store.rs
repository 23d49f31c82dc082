//! Exact-search vector store keyed by chunk text.

use crate::distance::DistanceMetric;
use crate::embedder::Embedder;
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

/// One chunk paired with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// Chunk text; unique within a store.
    pub chunk: String,
    /// Embedding of `chunk`.
    pub embedding: Vec<f32>,
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchHit {
    /// Matched chunk text.
    pub chunk: String,
    /// Similarity to the query under the store's metric.
    pub score: f32,
}

/// Output of [`VectorStore::search_by_text`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutput {
    /// Chunk texts only, best first.
    Texts(Vec<String>),
    /// Chunks with their scores, best first.
    Scored(Vec<SearchHit>),
}

impl SearchOutput {
    /// Drop scores and return chunk texts in rank order.
    pub fn into_texts(self) -> Vec<String> {
        match self {
            SearchOutput::Texts(texts) => texts,
            SearchOutput::Scored(hits) => hits.into_iter().map(|h| h.chunk).collect(),
        }
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        match self {
            SearchOutput::Texts(texts) => texts.len(),
            SearchOutput::Scored(hits) => hits.len(),
        }
    }

    /// True when nothing matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory mapping from chunk text to embedding with linear-scan search.
///
/// Records keep their first insertion position; re-inserting an existing
/// chunk replaces its embedding in place. That position is the tie-breaker
/// for equal scores, which keeps search results deterministic.
///
/// The first vector inserted fixes the store's dimensionality.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    records: Vec<VectorRecord>,
    positions: HashMap<String, usize>,
    dimensions: Option<usize>,
    metric: DistanceMetric,
}

impl VectorStore {
    /// Create an empty store using cosine similarity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store ranking with `metric`.
    pub fn with_metric(metric: DistanceMetric) -> Self {
        Self {
            metric,
            ..Self::default()
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dimensionality shared by all embeddings, if any were inserted.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Metric used by [`search`](Self::search).
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Embedding stored for `chunk`.
    pub fn get(&self, chunk: &str) -> Option<&[f32]> {
        self.positions
            .get(chunk)
            .map(|&idx| self.records[idx].embedding.as_slice())
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &VectorRecord> {
        self.records.iter()
    }

    /// Insert or overwrite the embedding for `chunk`.
    pub fn insert(&mut self, chunk: impl Into<String>, embedding: Vec<f32>) -> Result<()> {
        self.check_vector(&embedding)?;
        self.insert_unchecked(chunk.into(), embedding);
        Ok(())
    }

    fn insert_unchecked(&mut self, chunk: String, embedding: Vec<f32>) {
        if self.dimensions.is_none() {
            self.dimensions = Some(embedding.len());
        }

        match self.positions.get(&chunk) {
            Some(&idx) => self.records[idx].embedding = embedding,
            None => {
                self.positions.insert(chunk.clone(), self.records.len());
                self.records.push(VectorRecord { chunk, embedding });
            }
        }
    }

    fn check_vector(&self, embedding: &[f32]) -> Result<()> {
        check_vector_against(self.dimensions, embedding)
    }

    /// Embed `chunks` with one provider call and insert every pair.
    ///
    /// All-or-nothing: if the provider fails, returns the wrong number of
    /// vectors, or any vector is invalid, the store is left untouched.
    /// Returns the number of pairs inserted.
    pub async fn build_from_chunks(
        &mut self,
        chunks: &[String],
        embedder: &dyn Embedder,
    ) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = embedder.embed_batch(chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "Provider returned {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut expected = self.dimensions;
        for embedding in &embeddings {
            check_vector_against(expected, embedding)?;
            expected = Some(embedding.len());
        }

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            self.insert_unchecked(chunk.clone(), embedding);
        }

        debug!(
            inserted = chunks.len(),
            records = self.records.len(),
            model = embedder.model_name(),
            "Vector store built from chunks"
        );

        Ok(chunks.len())
    }

    /// Top-`k` records by descending similarity to `query`.
    ///
    /// Ties keep insertion order. Returns every record when the store holds
    /// fewer than `k`. `k == 0` is rejected.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.search_with_metric(query, k, self.metric)
    }

    /// Same as [`search`](Self::search) with an explicit metric.
    pub fn search_with_metric(
        &self,
        query: &[f32],
        k: usize,
        metric: DistanceMetric,
    ) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(Error::Configuration(
                "k must be greater than zero".to_string(),
            ));
        }
        if let Some(expected) = self.dimensions {
            if query.len() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .map(|(idx, record)| (idx, metric.similarity(query, &record.embedding)))
            .collect();

        // sort_by is stable, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| SearchHit {
                chunk: self.records[idx].chunk.clone(),
                score,
            })
            .collect())
    }

    /// Embed `query` and search.
    ///
    /// With `return_as_text` the scores are discarded.
    pub async fn search_by_text(
        &self,
        query: &str,
        k: usize,
        embedder: &dyn Embedder,
        return_as_text: bool,
    ) -> Result<SearchOutput> {
        if k == 0 {
            return Err(Error::Configuration(
                "k must be greater than zero".to_string(),
            ));
        }

        let query_embedding = embedder.embed_one(query).await?;
        let hits = self.search(&query_embedding, k)?;

        Ok(if return_as_text {
            SearchOutput::Texts(hits.into_iter().map(|h| h.chunk).collect())
        } else {
            SearchOutput::Scored(hits)
        })
    }
}

fn check_vector_against(expected: Option<usize>, embedding: &[f32]) -> Result<()> {
    if embedding.is_empty() {
        return Err(Error::InvalidVector("embedding is empty".to_string()));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidVector(
            "embedding contains NaN or infinite values".to_string(),
        ));
    }
    if let Some(expected) = expected {
        if embedding.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }
    }
    Ok(())
}
