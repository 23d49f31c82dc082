//! Mock implementations for testing.
//!
//! This module provides mock LLM clients, a deterministic embedder and a
//! provider factory that can be used across different test files without
//! duplication.

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use pdfchat::llm::{FragmentStream, LLMClient, ProviderFactory};
use pdfchat::types::{AppError, ChatMessage, Result};
use pdfchat_vector::Embedder;
use std::sync::Arc;

/// Mock LLM client for testing with configurable responses.
///
/// Every message list it receives is recorded, so tests can assert on the
/// exact prompt that would have been sent.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    model: String,
    seen: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            model: "mock-model".to_string(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    /// Every message list passed to `complete` or `stream`, in call order.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().clone()
    }

    fn record(&self, messages: &[ChatMessage]) -> Result<()> {
        self.seen.lock().push(messages.to_vec());
        if self.should_fail {
            return Err(AppError::Generation("Mock LLM failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.record(messages)?;
        Ok(self.response.clone())
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<FragmentStream> {
        self.record(messages)?;

        // Split response into chunks for streaming simulation
        let chunks: Vec<Result<String>> = self
            .response
            .chars()
            .collect::<Vec<_>>()
            .chunks(5)
            .map(|c| Ok(c.iter().collect()))
            .collect();

        Ok(Box::pin(stream::iter(chunks)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Deterministic embedder: a 26-dimensional letter histogram.
///
/// Identical texts get identical vectors, and texts sharing letters are
/// closer than texts that don't, which is enough to make retrieval order
/// predictable in tests.
#[derive(Clone, Default)]
pub struct StubEmbedder {
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

pub fn letter_histogram(text: &str) -> Vec<f32> {
    let mut v = vec![0.0; 26];
    for b in text.bytes() {
        let b = b.to_ascii_lowercase();
        if b.is_ascii_lowercase() {
            v[(b - b'a') as usize] += 1.0;
        }
    }
    v
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> pdfchat_vector::Result<Vec<Vec<f32>>> {
        *self.calls.lock() += 1;
        if self.fail {
            return Err(pdfchat_vector::Error::Embedding(
                "Mock embedding failure".to_string(),
            ));
        }
        Ok(texts.iter().map(|t| letter_histogram(t)).collect())
    }

    fn model_name(&self) -> &str {
        "stub-embedder"
    }
}

/// Provider factory handing out clones of fixed mocks.
#[derive(Clone)]
pub struct MockProviderFactory {
    pub llm: MockLLMClient,
    pub embedder: StubEmbedder,
    keys: Arc<Mutex<Vec<String>>>,
}

impl MockProviderFactory {
    pub fn new(llm: MockLLMClient, embedder: StubEmbedder) -> Self {
        Self {
            llm,
            embedder,
            keys: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// API keys seen, in request order.
    pub fn api_keys(&self) -> Vec<String> {
        self.keys.lock().clone()
    }
}

impl ProviderFactory for MockProviderFactory {
    fn llm_client(&self, api_key: &str, _model: Option<&str>) -> Result<Box<dyn LLMClient>> {
        self.keys.lock().push(api_key.to_string());
        Ok(Box::new(self.llm.clone()))
    }

    fn embedder(&self, api_key: &str) -> Result<Box<dyn Embedder>> {
        self.keys.lock().push(api_key.to_string());
        Ok(Box::new(self.embedder.clone()))
    }
}
