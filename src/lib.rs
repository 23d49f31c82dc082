//! # pdfchat - Document-grounded chat server
//!
//! Upload a document, get a session id, then ask questions answered by a
//! language model from the passages of that document most similar to each
//! question.
//!
//! ## Overview
//!
//! pdfchat can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `pdfchat-server` binary
//! 2. **As a library** - Build the router or the pipeline into your own service
//!
//! ### Library Example
//!
//! ```rust,ignore
//! use pdfchat::{AppConfigManager, AppState, OpenAIProviderFactory};
//! use std::sync::Arc;
//!
//! let config = Arc::new(AppConfigManager::new("pdfchat.toml")?);
//! let providers = Arc::new(OpenAIProviderFactory::new(Arc::clone(&config)));
//! let state = AppState::new(config, providers);
//!
//! let app = pdfchat::api::routes::build_app(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`llm`] - Text-generation client abstraction and OpenAI implementation
//! - [`rag`] - Loading, chunking, embedding, sessions and the retrieval pipeline
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration with hot reloading
//!
//! The vector store itself lives in the `pdfchat-vector` crate.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface for the server binary.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

use std::sync::Arc;

// Re-export commonly used types
pub use llm::{LLMClient, OpenAIProviderFactory, ProviderFactory};
pub use rag::{RagPipeline, SessionRegistry};
pub use types::{AppError, Result};
pub use utils::toml_config::{AppConfig, AppConfigManager};

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Live, hot-reloadable configuration
    pub config_manager: Arc<AppConfigManager>,
    /// Session id to vector store registry
    pub sessions: Arc<SessionRegistry>,
    /// Build and query orchestration
    pub pipeline: Arc<RagPipeline>,
    /// Builds provider clients from per-request credentials
    pub providers: Arc<dyn ProviderFactory>,
}

impl AppState {
    /// Wire up the registry and pipeline from the current configuration.
    pub fn new(config_manager: Arc<AppConfigManager>, providers: Arc<dyn ProviderFactory>) -> Self {
        let sessions = Arc::new(SessionRegistry::from_config(
            &config_manager.config().sessions,
        ));
        let pipeline = Arc::new(RagPipeline::new(
            Arc::clone(&config_manager),
            Arc::clone(&sessions),
        ));

        Self {
            config_manager,
            sessions,
            pipeline,
            providers,
        }
    }
}
