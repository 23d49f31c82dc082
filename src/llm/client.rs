//! LLM client abstractions and per-request provider construction
//!
//! The server never holds a long-lived provider credential. Every request
//! carries its own API key, and a [`ProviderFactory`] turns that key into a
//! text-generation client and an embedding client that live only for the
//! duration of the request.

use crate::types::{ChatMessage, Result};
use async_trait::async_trait;
use futures::Stream;
use pdfchat_vector::Embedder;
use std::pin::Pin;

/// Ordered text fragments from a streaming completion.
///
/// An `Err` item ends the stream; nothing follows it.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Generic LLM client trait for provider abstraction
///
/// Implementations must be safe to share across tasks; the HTTP layer holds
/// one per request but tests share mocks freely.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Run a full completion and return the concatenated answer text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Stream a completion as text fragments, in order
    async fn stream(&self, messages: &[ChatMessage]) -> Result<FragmentStream>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Builds provider clients from request-scoped credentials.
///
/// The factory reads whatever shared settings it needs (base URL, default
/// models, timeouts) at call time, so configuration reloads apply to the
/// next request.
pub trait ProviderFactory: Send + Sync {
    /// Text-generation client. `model` falls back to the configured default.
    fn llm_client(&self, api_key: &str, model: Option<&str>) -> Result<Box<dyn LLMClient>>;

    /// Embedding client using the configured embedding model.
    fn embedder(&self, api_key: &str) -> Result<Box<dyn Embedder>>;
}

/// Pick the request's model, ignoring blank overrides.
pub fn resolve_model<'a>(requested: Option<&'a str>, default: &'a str) -> &'a str {
    match requested.map(str::trim) {
        Some(model) if !model.is_empty() => model,
        _ => default,
    }
}
