use crate::AppState;
use crate::api::handlers::{chat, health, pdf};
use crate::types::{
    ChatRequest, ErrorResponse, HealthResponse, PdfChatRequest, PdfChatResponse, UploadResponse,
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pdfchat",
        description = "Upload a document, then ask questions answered from its content"
    ),
    paths(
        health::health,
        chat::chat,
        pdf::upload_pdf,
        pdf::chat_pdf,
    ),
    components(schemas(
        ChatRequest,
        PdfChatRequest,
        PdfChatResponse,
        UploadResponse,
        HealthResponse,
        ErrorResponse,
        pdf::UploadForm,
    )),
    tags(
        (name = "chat", description = "Raw streaming chat"),
        (name = "documents", description = "Document upload and grounded chat"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// API routes, relative to `/api`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .route("/upload_pdf", post(pdf::upload_pdf))
        .route("/chat_pdf", post(pdf::chat_pdf))
        .route("/openapi.json", get(openapi))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// The complete application: API under `/api`, CORS open to any origin,
/// request tracing and the configured body size limit.
pub fn build_app(state: AppState) -> Router {
    let max_body = state.config_manager.config().server.max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", create_router())
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMClient, ProviderFactory};
    use crate::types::{AppError, Result};
    use crate::{AppConfig, AppConfigManager};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pdfchat_vector::Embedder;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct NoProviders;

    impl ProviderFactory for NoProviders {
        fn llm_client(&self, _api_key: &str, _model: Option<&str>) -> Result<Box<dyn LLMClient>> {
            Err(AppError::Configuration("no provider".to_string()))
        }

        fn embedder(&self, _api_key: &str) -> Result<Box<dyn Embedder>> {
            Err(AppError::Configuration("no provider".to_string()))
        }
    }

    fn app() -> Router {
        let config = Arc::new(AppConfigManager::from_config(AppConfig::default()));
        build_app(AppState::new(config, Arc::new(NoProviders)))
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app()
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let response = app()
            .oneshot(
                Request::get("/api/health")
                    .header("origin", "https://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }

    #[test]
    fn test_openapi_lists_all_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/api/health", "/api/chat", "/api/upload_pdf", "/api/chat_pdf"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
