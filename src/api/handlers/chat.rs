use crate::{
    AppState,
    types::{ChatMessage, ChatRequest, ErrorResponse, Result},
};
use axum::{
    Json,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};

/// Stream a raw chat completion
///
/// Forwards the developer and user messages unchanged and streams the answer
/// back as plain text, fragment by fragment. The first fragment is awaited
/// before the response starts, so provider failures (bad key, unknown model,
/// rate limit) produce a JSON error. An error after that truncates the body.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Streamed answer text", body = String, content_type = "text/plain"),
        (status = 500, description = "Provider failure", body = ErrorResponse)
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Response> {
    let client = state
        .providers
        .llm_client(&payload.api_key, payload.model.as_deref())?;

    let messages = [
        ChatMessage::developer(payload.developer_message),
        ChatMessage::user(payload.user_message),
    ];

    let mut fragments = client.stream(&messages).await?;
    let first = fragments.next().await.transpose()?;
    tracing::debug!(model = client.model_name(), "Streaming chat started");

    let body = stream::iter(first.map(Ok))
        .chain(fragments)
        .inspect_err(|e| tracing::warn!(error = %e, "Chat stream ended with an error"))
        .map_ok(Bytes::from);

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}
