use std::sync::Arc;

use pdfchat_core::RetryPolicy;

use super::traits::{Embedder, EmbeddingError};

/// Collects `(position, text)` pairs and flushes them to the embedder in
/// fixed-size batches. Output pairs keep the order they were added in.
pub struct EmbeddingBatcher {
    buffer: Vec<(usize, String)>,
    batch_size: usize,
    embedder: Arc<dyn Embedder>,
    retry: RetryPolicy,
    batches_sent: usize,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            embedder,
            retry: RetryPolicy::none(),
            batches_sent: 0,
        }
    }

    /// Retry transient provider failures per batch with `policy`.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Add a text to the batch. Returns embeddings if the batch is full (auto-flush).
    pub async fn add(
        &mut self,
        position: usize,
        text: String,
    ) -> Result<Option<Vec<(usize, Vec<f32>)>>, EmbeddingError> {
        self.buffer.push((position, text));
        if self.buffer.len() >= self.batch_size {
            Ok(Some(self.flush().await?))
        } else {
            Ok(None)
        }
    }

    /// Force-flush remaining items.
    pub async fn flush(&mut self) -> Result<Vec<(usize, Vec<f32>)>, EmbeddingError> {
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }
        let batch: Vec<(usize, String)> = self.buffer.drain(..).collect();
        let texts: Vec<&str> = batch.iter().map(|(_, t)| t.as_str()).collect();
        self.batches_sent += 1;

        let label = format!("embedding batch {}", self.batches_sent);
        let embedder = &self.embedder;
        let embeddings = self
            .retry
            .run(&label, EmbeddingError::is_transient, || embedder.embed_batch(&texts))
            .await?;

        if embeddings.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: embeddings.len(),
            });
        }

        Ok(batch
            .into_iter()
            .zip(embeddings)
            .map(|((pos, _), emb)| (pos, emb))
            .collect())
    }

    /// Number of items currently buffered.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Number of provider calls made so far (retries not counted).
    pub fn batches_sent(&self) -> usize {
        self.batches_sent
    }
}
