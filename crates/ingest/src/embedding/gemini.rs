use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::traits::{check_embeddings, http_client, Embedder, EmbeddingError};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Task hint sent with each text; Gemini embeds queries and documents
/// slightly differently for asymmetric retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

impl TaskType {
    fn as_str(self) -> &'static str {
        match self {
            TaskType::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            TaskType::RetrievalQuery => "RETRIEVAL_QUERY",
        }
    }
}

/// Embedder backed by the Google Generative Language API.
pub struct GeminiEmbedder {
    client: Client,
    api_key: String,
    /// Always carries the `models/` prefix.
    model: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    pub fn new(api_key: String, model: String, dimensions: usize, timeout: Duration) -> Self {
        let model = if model.starts_with("models/") {
            model
        } else {
            format!("models/{model}")
        };
        Self {
            client: http_client(timeout),
            api_key,
            model,
            dimensions,
        }
    }

    fn build_request_body(model: &str, texts: &[&str], task: TaskType) -> serde_json::Value {
        let requests: Vec<serde_json::Value> = texts
            .iter()
            .map(|text| {
                json!({
                    "model": model,
                    "content": { "parts": [{ "text": text }] },
                    "taskType": task.as_str(),
                })
            })
            .collect();
        json!({ "requests": requests })
    }

    async fn embed(&self, texts: &[&str], task: TaskType) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{GEMINI_BASE_URL}/v1beta/{}:batchEmbedContents", self.model);
        let body = Self::build_request_body(&self.model, texts, task);

        debug!("Gemini embed request: model={} texts={} task={}", self.model, texts.len(), task.as_str());

        // Key goes in a header so it never shows up in URL-bearing error messages.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api { status, body });
        }

        let parsed: BatchEmbedResponse = response.json().await?;
        let embeddings: Vec<Vec<f32>> = parsed.embeddings.into_iter().map(|e| e.values).collect();
        check_embeddings(texts.len(), self.dimensions, &embeddings)?;
        Ok(embeddings)
    }
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed(texts, TaskType::RetrievalDocument).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text], TaskType::RetrievalQuery).await?;
        Ok(vectors.remove(0))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
