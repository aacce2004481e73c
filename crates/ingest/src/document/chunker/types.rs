//! Chunk configuration and output types.

use pdfchat_core::config::ChunkingConfig;
use thiserror::Error;

// ── Configuration ───────────────────────────────────────────────────────────

/// Configuration for the splitter. Sizes are in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum characters per chunk (default: 1000).
    pub chunk_size: usize,
    /// Characters carried over from the previous chunk (default: 200).
    pub chunk_overlap: usize,
    /// Preferred split boundary (default: newline).
    pub separator: String,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separator: "\n".to_string(),
        }
    }
}

impl From<&ChunkingConfig> for ChunkConfig {
    fn from(c: &ChunkingConfig) -> Self {
        Self {
            chunk_size: c.chunk_size,
            chunk_overlap: c.chunk_overlap,
            separator: c.separator.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkConfigError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },
    #[error("separator must not be empty")]
    EmptySeparator,
}

impl ChunkConfig {
    pub fn validate(&self) -> Result<(), ChunkConfigError> {
        if self.chunk_size == 0 {
            return Err(ChunkConfigError::ZeroChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkConfigError::OverlapTooLarge {
                overlap: self.chunk_overlap,
                size: self.chunk_size,
            });
        }
        if self.separator.is_empty() {
            return Err(ChunkConfigError::EmptySeparator);
        }
        Ok(())
    }
}

// ── Chunk output ────────────────────────────────────────────────────────────

/// A bounded segment of the corpus; the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in splitter output.
    pub index: usize,
    pub content: String,
}
