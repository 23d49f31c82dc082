use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// Raw chat: developer/user message pair streamed straight to the model.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub developer_message: String,
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub api_key: String,
}

/// Question against a previously uploaded document.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PdfChatRequest {
    pub session_id: String,
    pub user_message: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Number of passages to retrieve; defaults to `rag.top_k`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PdfChatResponse {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

// ============= Message Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Developer,
    User,
}

/// A role-tagged message sent to the text-generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn developer(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Developer, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    /// Carries the requested id for logging; the message stays generic.
    #[error("Session not found")]
    SessionNotFound(String),

    #[error("Document load error: {0}")]
    DocumentLoad(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::Configuration(_) => StatusCode::BAD_REQUEST,
            AppError::DocumentLoad(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Embedding(_)
            | AppError::Generation(_)
            | AppError::Timeout(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<pdfchat_vector::Error> for AppError {
    fn from(err: pdfchat_vector::Error) -> Self {
        use pdfchat_vector::Error as VectorError;

        match err {
            VectorError::Configuration(msg) => AppError::Configuration(msg),
            VectorError::Timeout(msg) => AppError::Timeout(msg),
            VectorError::Embedding(msg) => AppError::Embedding(msg),
            // Bad vectors can only come from the provider
            other @ (VectorError::DimensionMismatch { .. } | VectorError::InvalidVector(_)) => {
                AppError::Embedding(other.to_string())
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            detail: self.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
