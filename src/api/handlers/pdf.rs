use crate::{
    AppState,
    rag::AnswerOptions,
    types::{AppError, ErrorResponse, PdfChatRequest, PdfChatResponse, Result, UploadResponse},
};
use axum::{
    Json,
    extract::{Multipart, State},
};
use utoipa::ToSchema;

/// Multipart form accepted by `upload_pdf` (documentation only).
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    api_key: String,
}

struct UploadedFile {
    name: Option<String>,
    bytes: Vec<u8>,
}

/// Upload a document and build a session for it
#[utoipa::path(
    post,
    path = "/api/upload_pdf",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Session created", body = UploadResponse),
        (status = 400, description = "Missing field or invalid configuration", body = ErrorResponse),
        (status = 422, description = "Document could not be read", body = ErrorResponse),
        (status = 500, description = "Embedding provider failure", body = ErrorResponse)
    ),
    tag = "documents"
)]
pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut file: Option<UploadedFile> = None;
    let mut api_key: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("failed to read file: {}", e)))?;
                file = Some(UploadedFile {
                    name,
                    bytes: bytes.to_vec(),
                });
            }
            Some("api_key") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("failed to read api_key: {}", e)))?;
                api_key = Some(value);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::InvalidInput("missing field: file".to_string()))?;
    let api_key =
        api_key.ok_or_else(|| AppError::InvalidInput("missing field: api_key".to_string()))?;

    tracing::debug!(
        file_name = file.name.as_deref().unwrap_or("<unnamed>"),
        bytes = file.bytes.len(),
        "Document upload received"
    );

    let embedder = state.providers.embedder(&api_key)?;
    let session_id = state
        .pipeline
        .build_from_upload(file.name.as_deref(), &file.bytes, embedder.as_ref())
        .await?;

    Ok(Json(UploadResponse { session_id }))
}

/// Ask a question about an uploaded document
#[utoipa::path(
    post,
    path = "/api/chat_pdf",
    request_body = PdfChatRequest,
    responses(
        (status = 200, description = "Answer grounded in the document", body = PdfChatResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Provider failure", body = ErrorResponse)
    ),
    tag = "documents"
)]
pub async fn chat_pdf(
    State(state): State<AppState>,
    Json(payload): Json<PdfChatRequest>,
) -> Result<Json<PdfChatResponse>> {
    // Fail fast before building provider clients
    if !state.sessions.contains(&payload.session_id) {
        return Err(AppError::SessionNotFound(payload.session_id));
    }

    let embedder = state.providers.embedder(&payload.api_key)?;
    let llm = state
        .providers
        .llm_client(&payload.api_key, payload.model.as_deref())?;

    let options = AnswerOptions {
        k: payload.k,
        system_prompt: payload.system_prompt,
    };

    let answer = state
        .pipeline
        .answer(
            &payload.session_id,
            &payload.user_message,
            options,
            embedder.as_ref(),
            llm.as_ref(),
        )
        .await?;

    Ok(Json(PdfChatResponse { answer }))
}
