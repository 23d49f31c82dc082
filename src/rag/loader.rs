//! Document loading
//!
//! Turns a file or a directory of files into raw text strings. PDF content is
//! recognised by its `%PDF-` header rather than the file name; everything
//! else must be UTF-8 text.

use crate::types::{AppError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "pdf"];

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load one raw text per document.
    ///
    /// A directory yields every supported file directly inside it, sorted by
    /// path. Subdirectories are not descended into.
    pub async fn load(&self, path: &Path) -> Result<Vec<String>> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| AppError::DocumentLoad(format!("cannot read {}: {}", path.display(), e)))?;

        if !metadata.is_dir() {
            return Ok(vec![self.load_file(path).await?]);
        }

        let mut files = Self::supported_files(path).await?;
        files.sort();
        debug!(dir = %path.display(), files = files.len(), "Loading document directory");

        let mut texts = Vec::with_capacity(files.len());
        for file in &files {
            texts.push(self.load_file(file).await?);
        }
        Ok(texts)
    }

    async fn supported_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let read_err =
            |e: std::io::Error| AppError::DocumentLoad(format!("cannot read {}: {}", dir.display(), e));

        let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let path = entry.path();
            let is_file = entry.file_type().await.map_err(read_err)?.is_file();
            if is_file && has_supported_extension(&path) {
                files.push(path);
            }
        }

        Ok(files)
    }

    async fn load_file(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::DocumentLoad(format!("cannot read {}: {}", path.display(), e)))?;

        let extension = path.extension().and_then(|e| e.to_str());
        self.extract_text(bytes, extension).await
    }

    /// Extract text from raw document bytes.
    ///
    /// `extension` is only a hint: a `.pdf` name on non-PDF content is
    /// rejected, and PDF content is parsed whatever it is called.
    pub async fn extract_text(&self, bytes: Vec<u8>, extension: Option<&str>) -> Result<String> {
        if is_pdf(&bytes) {
            return extract_pdf(bytes).await;
        }

        if extension.is_some_and(|e| e.eq_ignore_ascii_case("pdf")) {
            return Err(AppError::DocumentLoad(
                "file is not a valid PDF document".to_string(),
            ));
        }

        String::from_utf8(bytes)
            .map_err(|_| AppError::DocumentLoad("document is neither PDF nor UTF-8 text".to_string()))
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

async fn extract_pdf(bytes: Vec<u8>) -> Result<String> {
    // pdf-extract is synchronous and panics on some malformed files
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::DocumentLoad(format!("PDF parser crashed: {}", e)))?;

    extracted.map_err(|e| AppError::DocumentLoad(format!("failed to parse PDF: {}", e)))
}
