use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pdfchat_core::RetryPolicy;
use pdfchat_ingest::{Chunk, Embedder, EmbeddingBatcher, EmbeddingError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::IndexError;
use crate::metric::Metric;

/// File written inside the index directory.
pub const INDEX_FILE_NAME: &str = "index.msgpack";

const FORMAT_VERSION: u32 = 1;

/// One stored chunk and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexEntry {
    content: String,
    vector: Vec<f32>,
}

/// A retrieved passage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// 0-based rank in the result list.
    pub rank: usize,
    /// Position of the chunk in the index (chunker order).
    pub position: usize,
    pub content: String,
    /// Raw metric value: distance for Euclidean, similarity for Cosine.
    pub score: f32,
}

/// Knobs for [`VectorIndex::build`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub batch_size: usize,
    pub retry: RetryPolicy,
    pub metric: Metric,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            batch_size: 64,
            retry: RetryPolicy::default(),
            metric: Metric::default(),
        }
    }
}

/// In-memory collection of `(chunk text, vector)` pairs with exact
/// nearest-neighbour search.
///
/// Persisted as a single MessagePack document (`index.msgpack`) holding a
/// small header (format version, dimension, metric, embedding model,
/// creation time) followed by the entries in chunker order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    format_version: u32,
    dimension: usize,
    metric: Metric,
    embedding_model: String,
    created_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build an index from pre-computed `(text, vector)` pairs. Every vector
    /// must have the same length.
    pub fn from_entries(
        entries: Vec<(String, Vec<f32>)>,
        metric: Metric,
        embedding_model: impl Into<String>,
    ) -> Result<Self, IndexError> {
        let dimension = entries.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((_, bad)) = entries.iter().find(|(_, v)| v.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }
        Ok(Self {
            format_version: FORMAT_VERSION,
            dimension,
            metric,
            embedding_model: embedding_model.into(),
            created_at: Utc::now(),
            entries: entries
                .into_iter()
                .map(|(content, vector)| IndexEntry { content, vector })
                .collect(),
        })
    }

    /// Embed every chunk and build a fresh index.
    ///
    /// Rejects an empty chunk sequence before contacting the provider.
    /// Batches are sent one after another, so entries end up in chunker
    /// order regardless of batch size.
    pub async fn build(
        chunks: &[Chunk],
        embedder: Arc<dyn Embedder>,
        options: &BuildOptions,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        let model = embedder.model_name().to_string();
        let dimension = embedder.dimensions();
        let mut batcher = EmbeddingBatcher::new(embedder, options.batch_size)
            .with_retry(options.retry.clone());

        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; chunks.len()];
        for (pos, chunk) in chunks.iter().enumerate() {
            if let Some(done) = batcher.add(pos, chunk.content.clone()).await? {
                store_batch(&mut vectors, done, dimension)?;
            }
        }
        let done = batcher.flush().await?;
        store_batch(&mut vectors, done, dimension)?;

        let filled = vectors.iter().filter(|v| v.is_some()).count();
        if filled != chunks.len() {
            return Err(IndexError::Embedding(EmbeddingError::CountMismatch {
                expected: chunks.len(),
                actual: filled,
            }));
        }
        let entries: Vec<(String, Vec<f32>)> = chunks
            .iter()
            .zip(vectors.into_iter().flatten())
            .map(|(chunk, vector)| (chunk.content.clone(), vector))
            .collect();

        info!(
            "Built index: {} chunks, {} dims, {} batches, model={}",
            entries.len(),
            dimension,
            batcher.batches_sent(),
            model
        );

        Self::from_entries(entries, options.metric, model)
    }

    /// Write the index to `dir/index.msgpack`, replacing whatever was there.
    ///
    /// The file is written to a temporary sibling and renamed into place.
    /// Nothing guards against two writers at once.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf, IndexError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(INDEX_FILE_NAME);
        let tmp = dir.join(format!("{INDEX_FILE_NAME}.tmp"));

        let encoded =
            rmp_serde::to_vec_named(self).map_err(|e| IndexError::Encode(e.to_string()))?;

        let written = write_file(&tmp, &encoded).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            // The previous index, if any, is still in place.
            let _ = fs::remove_file(&tmp);
            return Err(IndexError::Io(e));
        }

        info!(
            "Index saved at {} ({} entries, {} bytes)",
            path.display(),
            self.entries.len(),
            encoded.len()
        );
        Ok(path)
    }

    /// Load a previously persisted index from `dir`.
    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let path = dir.join(INDEX_FILE_NAME);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IndexError::NotFound(dir.to_path_buf()));
            }
            Err(e) => return Err(IndexError::Io(e)),
        };

        let corrupt = |reason: String| IndexError::Corrupt {
            path: path.clone(),
            reason,
        };

        let index: Self = rmp_serde::from_slice(&data).map_err(|e| corrupt(e.to_string()))?;

        if index.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                index.format_version
            )));
        }
        if let Some(bad) = index.entries.iter().find(|e| e.vector.len() != index.dimension) {
            return Err(corrupt(format!(
                "entry has {} dimensions, header says {}",
                bad.vector.len(),
                index.dimension
            )));
        }

        debug!(
            "Loaded index from {}: {} entries, model={}",
            path.display(),
            index.entries.len(),
            index.embedding_model
        );
        Ok(index)
    }

    /// Up to `k` entries ranked most-similar first. Ties keep insertion
    /// order. An empty index yields an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, self.metric.score(query, &entry.vector)))
            .collect();
        // sort_by is stable, which gives the insertion-order tie-break.
        scored.sort_by(|a, b| self.metric.compare(a.1, b.1));

        Ok(scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(rank, (position, score))| SearchHit {
                rank,
                position,
                content: self.entries[position].content.clone(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Stored chunk texts in insertion order.
    pub fn contents(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.content.as_str())
    }
}

fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = io::BufWriter::new(fs::File::create(path)?);
    file.write_all(data)?;
    file.flush()
}

fn store_batch(
    slots: &mut [Option<Vec<f32>>],
    batch: Vec<(usize, Vec<f32>)>,
    dimension: usize,
) -> Result<(), IndexError> {
    for (pos, vector) in batch {
        if vector.len() != dimension {
            return Err(IndexError::Embedding(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            }));
        }
        slots[pos] = Some(vector);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
