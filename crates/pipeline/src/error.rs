use std::path::PathBuf;

use pdfchat_core::ConfigError;
use pdfchat_index::IndexError;
use pdfchat_ingest::{ChunkConfigError, EmbeddingError, ExtractionError};
use pdfchat_llm::LlmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no documents uploaded; add at least one PDF")]
    NoDocuments,

    #[error("question is empty")]
    EmptyQuestion,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("no extractable text found in the uploaded documents (scanned PDFs without a text layer are not supported)")]
    EmptyCorpus,

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("no index found at {}; ingest documents first", .0.display())]
    NoIndex(PathBuf),

    #[error("index at {} is corrupt ({reason}); re-ingest your documents", .path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("index error: {0}")]
    Index(IndexError),

    #[error("answer generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid chunk settings: {0}")]
    Chunking(#[from] ChunkConfigError),
}

impl From<IndexError> for PipelineError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::EmptyCorpus => Self::EmptyCorpus,
            IndexError::NotFound(dir) => Self::NoIndex(dir),
            IndexError::Corrupt { path, reason } => Self::IndexCorrupt { path, reason },
            IndexError::Embedding(inner) => Self::Embedding(inner),
            other => Self::Index(other),
        }
    }
}
