use crate::types::{AppError, Result};
use crate::utils::toml_config::RagConfig;

/// Fixed-size character splitter with overlap.
///
/// Sizes are counted in Unicode scalar values, never bytes, so a chunk
/// boundary can't fall inside a multi-byte character. Chunk `i` starts at
/// character `i * (chunk_size - chunk_overlap)`; splitting stops at the first
/// chunk that reaches the end of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AppError::Configuration(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        // Byte offset of every char, plus the end of the string
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = bounds.len() - 1;

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < char_count {
            let end = (start + self.chunk_size).min(char_count);
            chunks.push(text[bounds[start]..bounds[end]].to_string());

            if end == char_count {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Chunk each text independently and concatenate, preserving order.
    pub fn chunk_texts<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts
            .iter()
            .flat_map(|text| self.chunk(text.as_ref()))
            .collect()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}
