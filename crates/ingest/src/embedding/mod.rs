pub mod batcher;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use pdfchat_core::Config;

pub use batcher::EmbeddingBatcher;
pub use gemini::GeminiEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};

/// Create the embedding backend selected by `EMBEDDING_PROVIDER`.
pub fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    let emb = &config.embedding;
    let dims = emb.resolved_dimensions();
    let timeout = config.network.timeout();

    match emb.provider.as_str() {
        "gemini" => {
            let api_key = config
                .credentials
                .google_api_key
                .clone()
                .ok_or_else(|| EmbeddingError::NotConfigured("GOOGLE_API_KEY not set".into()))?;
            Ok(Arc::new(GeminiEmbedder::new(
                api_key,
                emb.gemini_model.clone(),
                dims,
                timeout,
            )))
        }
        "openai" => {
            let api_key = config
                .credentials
                .openai_api_key
                .clone()
                .ok_or_else(|| EmbeddingError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            Ok(Arc::new(OpenAiEmbedder::new(
                api_key,
                emb.openai_model.clone(),
                Some(config.credentials.openai_base_url.clone()),
                dims,
                timeout,
            )))
        }
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(
            config.ollama.url.clone(),
            config.ollama.embedding_model.clone(),
            dims,
            timeout,
        ))),
        other => Err(EmbeddingError::NotConfigured(format!(
            "unknown embedding provider: '{other}'"
        ))),
    }
}
