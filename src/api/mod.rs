//! HTTP API Handlers and Routes
//!
//! The REST layer over the retrieval pipeline, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! - `POST /api/chat` - Stream a raw completion for a developer/user message pair
//! - `POST /api/upload_pdf` - Multipart `file` + `api_key`, returns a `session_id`
//! - `POST /api/chat_pdf` - Ask a question about an uploaded document
//! - `GET /api/health` - Health check endpoint
//! - `GET /api/openapi.json` - OpenAPI document
//!
//! # Credentials
//!
//! There is no server-side authentication. Each request carries the caller's
//! provider API key, which is used for that request only and never stored.
//!
//! # Errors
//!
//! Every failure is returned as `{"detail": "<message>"}` with the status
//! code chosen by [`AppError`](crate::types::AppError).

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
