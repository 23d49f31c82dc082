//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! # Module Structure
//!
//! - [`loader`] - Plain text / PDF extraction, single files or directories
//! - [`chunker`] - Fixed-size character chunking with overlap
//! - [`embeddings`] - OpenAI-compatible embedding provider
//! - [`staging`] - Temporary on-disk copy of an upload
//! - [`sessions`] - Session id to vector store registry
//! - [`pipeline`] - Build and query orchestration
//!
//! # RAG Pipeline
//!
//! 1. **Ingestion** - The upload is staged, loaded and chunked
//! 2. **Storage** - Chunks are embedded into a fresh in-memory store
//! 3. **Registration** - The store is registered under a new session id
//! 4. **Retrieval** - The question is embedded and the top-k chunks found
//! 5. **Generation** - The model answers with those chunks as context
//!
//! # Example
//!
//! ```ignore
//! let session_id = pipeline.build_from_upload(Some("paper.pdf"), &bytes, &*embedder).await?;
//! let answer = pipeline
//!     .answer(&session_id, "What is the main result?", AnswerOptions::default(), &*embedder, &*llm)
//!     .await?;
//! ```

pub mod chunker;
pub mod embeddings;
pub mod loader;
pub mod pipeline;
pub mod sessions;
pub mod staging;

pub use pipeline::{AnswerOptions, RagPipeline};
pub use sessions::SessionRegistry;
