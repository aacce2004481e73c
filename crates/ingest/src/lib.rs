//! Ingestion side of the pipeline: pull text out of uploaded PDFs, split it
//! into overlapping chunks, and turn chunks into embedding vectors.

pub mod document;
pub mod embedding;

pub use document::chunker::{split_text, Chunk, ChunkConfig, ChunkConfigError};
pub use document::{extract_text, Document, ExtractionError};
pub use embedding::{create_embedder, Embedder, EmbeddingBatcher, EmbeddingError};
