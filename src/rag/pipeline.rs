use crate::llm::LLMClient;
use crate::rag::chunker::TextChunker;
use crate::rag::loader::DocumentLoader;
use crate::rag::sessions::SessionRegistry;
use crate::rag::staging::StagedFile;
use crate::types::{AppError, ChatMessage, Result};
use crate::utils::toml_config::AppConfigManager;
use pdfchat_vector::{Embedder, VectorStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Per-question overrides for [`RagPipeline::answer`].
#[derive(Debug, Clone, Default)]
pub struct AnswerOptions {
    /// Passages to retrieve; the configured `top_k` when `None`.
    pub k: Option<usize>,
    /// Instruction placed before the context; the configured default when `None`.
    pub system_prompt: Option<String>,
}

/// Build and query phases of document-grounded chat.
///
/// Building stages the upload, extracts and chunks its text, embeds every
/// chunk and only then registers a new session, so a failed build leaves
/// no trace. Answering retrieves the closest chunks for the question and
/// asks the model with those chunks as context.
pub struct RagPipeline {
    config: Arc<AppConfigManager>,
    sessions: Arc<SessionRegistry>,
    loader: DocumentLoader,
}

impl RagPipeline {
    pub fn new(config: Arc<AppConfigManager>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            config,
            sessions,
            loader: DocumentLoader::new(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Build a session from uploaded bytes. The staged copy is removed on
    /// every exit path.
    pub async fn build_from_upload(
        &self,
        file_name: Option<&str>,
        bytes: &[u8],
        embedder: &dyn Embedder,
    ) -> Result<String> {
        if bytes.is_empty() {
            return Err(AppError::InvalidInput("uploaded file is empty".to_string()));
        }

        let extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .unwrap_or("pdf");
        let staging_dir = self.config.config().rag.staging_dir();

        let staged = StagedFile::write(&staging_dir, extension, bytes).await?;
        self.build_from_path(staged.path(), embedder).await
    }

    /// Build a session from a file or a directory of documents.
    pub async fn build_from_path(&self, path: &Path, embedder: &dyn Embedder) -> Result<String> {
        let start = Instant::now();
        let config = self.config.config();
        let chunker = TextChunker::from_config(&config.rag)?;

        let texts = self.loader.load(path).await?;
        let chunks = chunker.chunk_texts(&texts);
        if chunks.is_empty() {
            return Err(AppError::DocumentLoad("no extractable text".to_string()));
        }
        debug!(documents = texts.len(), chunks = chunks.len(), "Document chunked");

        let mut store = VectorStore::new();
        store.build_from_chunks(&chunks, embedder).await?;
        let stored = store.len();
        let dimensions = store.dimensions().unwrap_or(0);

        let session_id = self.sessions.insert(store);

        info!(
            session_id = %session_id,
            chunks = stored,
            dimensions,
            embedding_model = embedder.model_name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Session built"
        );

        Ok(session_id)
    }

    /// Answer a question from one session's document.
    pub async fn answer(
        &self,
        session_id: &str,
        question: &str,
        options: AnswerOptions,
        embedder: &dyn Embedder,
        llm: &dyn LLMClient,
    ) -> Result<String> {
        let start = Instant::now();
        let config = self.config.config();

        let store = self
            .sessions
            .get(session_id)
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

        let k = options.k.unwrap_or(config.rag.top_k);
        let passages = store
            .search_by_text(question, k, embedder, true)
            .await?
            .into_texts();
        let context = passages.join("\n");

        let instruction = options
            .system_prompt
            .as_deref()
            .unwrap_or(&config.rag.default_system_prompt);
        let prompt = build_prompt(instruction, &context, question);

        let answer = llm.complete(&[ChatMessage::system(prompt)]).await?;

        info!(
            session_id = %session_id,
            passages = passages.len(),
            model = llm.model_name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Question answered"
        );

        Ok(answer)
    }
}

/// Single-message prompt: instruction, retrieved context, then the question.
pub fn build_prompt(instruction: &str, context: &str, question: &str) -> String {
    format!("{instruction}\n\nContext:\n{context}\n\nQuestion: {question}\nAnswer:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FragmentStream;
    use crate::types::MessageRole;
    use crate::utils::toml_config::AppConfig;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::num::NonZeroUsize;

    /// 26-dim letter histogram, enough to make identical text the best match.
    struct LetterEmbedder;

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> pdfchat_vector::Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; 26];
                    for c in t.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                        v[(c - b'a') as usize] += 1.0;
                    }
                    v
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "letters"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed_batch(&self, _texts: &[String]) -> pdfchat_vector::Result<Vec<Vec<f32>>> {
            Err(pdfchat_vector::Error::Embedding("401 Unauthorized".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[derive(Default)]
    struct RecordingLLM {
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl LLMClient for RecordingLLM {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().extend_from_slice(messages);
            Ok("42".to_string())
        }

        async fn stream(&self, _messages: &[ChatMessage]) -> Result<FragmentStream> {
            Err(AppError::Generation("not used".to_string()))
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn pipeline(staging: &Path, chunk_size: usize, overlap: usize) -> RagPipeline {
        let mut config = AppConfig::default();
        config.rag.chunk_size = chunk_size;
        config.rag.chunk_overlap = overlap;
        config.rag.staging_dir = Some(staging.to_path_buf());

        RagPipeline::new(
            Arc::new(AppConfigManager::from_config(config)),
            Arc::new(SessionRegistry::new(NonZeroUsize::new(8).unwrap(), None)),
        )
    }

    fn staged_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_build_prompt_format() {
        let prompt = build_prompt("Be helpful.", "a\nb", "why?");
        assert_eq!(prompt, "Be helpful.\n\nContext:\na\nb\n\nQuestion: why?\nAnswer:");
    }

    #[tokio::test]
    async fn test_build_and_answer() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 20, 0);
        let text = "zebras zigzag zones.quiet quilts queue.";

        let session_id = pipeline
            .build_from_upload(Some("notes.txt"), text.as_bytes(), &LetterEmbedder)
            .await
            .unwrap();
        assert_eq!(staged_count(dir.path()), 0);

        let llm = RecordingLLM::default();
        let options = AnswerOptions {
            k: Some(1),
            system_prompt: Some("Answer briefly.".to_string()),
        };
        let answer = pipeline
            .answer(&session_id, "zebras zigzag zones.", options, &LetterEmbedder, &llm)
            .await
            .unwrap();
        assert_eq!(answer, "42");

        let seen = llm.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].role, MessageRole::System);
        assert_eq!(
            seen[0].content,
            "Answer briefly.\n\nContext:\nzebras zigzag zones.\n\nQuestion: zebras zigzag zones.\nAnswer:"
        );
    }

    #[tokio::test]
    async fn test_default_system_prompt_used() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 1000, 200);
        let session_id = pipeline
            .build_from_upload(Some("a.txt"), b"some text", &LetterEmbedder)
            .await
            .unwrap();

        let llm = RecordingLLM::default();
        pipeline
            .answer(&session_id, "q", AnswerOptions::default(), &LetterEmbedder, &llm)
            .await
            .unwrap();

        let seen = llm.seen.lock();
        assert!(seen[0]
            .content
            .starts_with(crate::utils::toml_config::DEFAULT_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_failed_embedding_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 1000, 200);

        let result = pipeline
            .build_from_upload(Some("a.txt"), b"some text", &FailingEmbedder)
            .await;

        assert!(matches!(result, Err(AppError::Embedding(_))));
        assert!(pipeline.sessions().is_empty());
        assert_eq!(staged_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_empty_document_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 1000, 200);

        let result = pipeline
            .build_from_path(&write_file(dir.path(), "blank.txt", ""), &LetterEmbedder)
            .await;

        assert!(matches!(result, Err(AppError::DocumentLoad(_))));
        assert!(pipeline.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 1000, 200);
        let llm = RecordingLLM::default();

        let result = pipeline
            .answer("nope", "q", AnswerOptions::default(), &LetterEmbedder, &llm)
            .await;

        assert!(matches!(result, Err(AppError::SessionNotFound(_))));
        assert!(llm.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_zero_k_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path(), 1000, 200);
        let session_id = pipeline
            .build_from_upload(Some("a.txt"), b"text", &LetterEmbedder)
            .await
            .unwrap();

        let options = AnswerOptions {
            k: Some(0),
            ..AnswerOptions::default()
        };
        let result = pipeline
            .answer(&session_id, "q", options, &LetterEmbedder, &RecordingLLM::default())
            .await;

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}
