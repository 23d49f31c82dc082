//! LLM Provider Clients and Abstractions
//!
//! The rest of the application talks to the text-generation service only
//! through [`LLMClient`], and obtains clients through a [`ProviderFactory`]
//! using the caller's own credentials.
//!
//! # Streaming
//!
//! [`LLMClient::stream`] returns a [`FragmentStream`], a
//! `Pin<Box<dyn Stream<Item = Result<String>>>>` of answer fragments in the
//! order the provider produced them.

/// Core LLM client trait and provider factory.
pub mod client;
/// OpenAI-compatible client (chat completions, streaming).
pub mod openai;

pub use client::{FragmentStream, LLMClient, ProviderFactory};
pub use openai::{OpenAIClient, OpenAIProviderFactory};
