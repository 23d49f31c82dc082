//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Raw streaming chat handler.
pub mod chat;
/// Liveness handler.
pub mod health;
/// Document upload and document-grounded chat handlers.
pub mod pdf;
