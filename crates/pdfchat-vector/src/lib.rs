//! # pdfchat-vector
//!
//! An in-memory vector store for session-scoped retrieval. Each store maps
//! chunk text to one embedding and answers k-nearest-neighbor queries by
//! exact linear scan; there is no index structure and nothing is persisted.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pdfchat_vector::{VectorStore, Embedder};
//!
//! let mut store = VectorStore::new();
//! store.build_from_chunks(&chunks, &embedder).await?;
//!
//! let top = store
//!     .search_by_text("what is the refund policy?", 4, &embedder, true)
//!     .await?
//!     .into_texts();
//! ```
//!
//! ## Guarantees
//!
//! - Every embedding in a store has the same dimensionality.
//! - `build_from_chunks` is all-or-nothing.
//! - Search results are sorted by non-increasing score, ties in insertion order.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod embedder;
pub mod error;
pub mod store;

pub use distance::{cosine_similarity, DistanceMetric};
pub use embedder::Embedder;
pub use error::{Error, Result};
pub use store::{SearchHit, SearchOutput, VectorRecord, VectorStore};
