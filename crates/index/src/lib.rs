//! Durable vector index over chunk embeddings.
//!
//! The index is built in memory from a chunk sequence, written wholesale to
//! a directory, and read back wholesale for querying. Search is an exact
//! scan, which is plenty for the few thousand chunks a handful of PDFs
//! produce.

pub mod error;
pub mod index;
pub mod metric;

pub use error::IndexError;
pub use index::{BuildOptions, SearchHit, VectorIndex, INDEX_FILE_NAME};
pub use metric::Metric;
