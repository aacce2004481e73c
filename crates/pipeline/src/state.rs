use std::fmt;

/// Stages of the ingestion flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestState {
    Idle,
    Extracting,
    Chunking,
    Embedding,
    Persisting,
    Persisted,
    Failed(String),
}

/// Stages of the query flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    LoadingIndex,
    EmbeddingQuery,
    Searching,
    Generating,
    Answered,
    Failed(String),
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Extracting => f.write_str("extracting"),
            Self::Chunking => f.write_str("chunking"),
            Self::Embedding => f.write_str("embedding"),
            Self::Persisting => f.write_str("persisting"),
            Self::Persisted => f.write_str("persisted"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::LoadingIndex => f.write_str("loading index"),
            Self::EmbeddingQuery => f.write_str("embedding query"),
            Self::Searching => f.write_str("searching"),
            Self::Generating => f.write_str("generating"),
            Self::Answered => f.write_str("answered"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
