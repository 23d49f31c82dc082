//! Error types for pdfchat-vector.

use thiserror::Error;

/// Result type for vector store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vector store operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Dimension mismatch between a vector and the store.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensions fixed by the first vector in the store.
        expected: usize,
        /// Dimensions of the offending vector.
        actual: usize,
    },

    /// Invalid vector (empty, NaN or infinite components).
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Invalid search or store parameters (e.g. `k == 0`).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The embedding provider failed. The whole batch is considered failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The embedding provider did not answer within the configured timeout.
    #[error("Embedding request timed out: {0}")]
    Timeout(String),
}
