//! Character-based text splitter.
//!
//! Splits raw corpus text into bounded, overlapping chunks suitable for
//! embedding. Text is cut at a preferred separator (newline by default) and
//! greedily re-joined up to the chunk size; each chunk starts with the tail
//! of its predecessor so context survives chunk boundaries.

mod helpers;
mod splitter;
mod types;

pub use splitter::split_text;
pub use types::{Chunk, ChunkConfig, ChunkConfigError};
