use std::path::PathBuf;

use pdfchat_ingest::EmbeddingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot build an index from an empty corpus: no text chunks were produced")]
    EmptyCorpus,

    #[error("no index found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("index at {} is unreadable: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown distance metric '{0}' (expected euclidean or cosine)")]
    UnknownMetric(String),

    #[error("failed to encode index: {0}")]
    Encode(String),
}
