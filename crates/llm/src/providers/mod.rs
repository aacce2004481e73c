pub mod gemini;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use pdfchat_core::Config;

use crate::provider::{LlmError, LlmProvider};

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Create the generation backend selected by `LLM_PROVIDER`.
pub fn create_provider(config: &Config) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let llm = &config.llm;
    let timeout = config.network.timeout();

    match llm.provider.as_str() {
        "gemini" => {
            let api_key = config
                .credentials
                .google_api_key
                .clone()
                .ok_or_else(|| LlmError::NotConfigured("GOOGLE_API_KEY not set".into()))?;
            Ok(Arc::new(GeminiProvider::new(
                api_key,
                llm.gemini_model.clone(),
                timeout,
            )))
        }
        "openai" => {
            let api_key = config
                .credentials
                .openai_api_key
                .clone()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            Ok(Arc::new(OpenAiProvider::new(
                api_key,
                llm.openai_model.clone(),
                config.credentials.openai_base_url.clone(),
                timeout,
            )))
        }
        "ollama" => Ok(Arc::new(OllamaProvider::new(
            config.ollama.url.clone(),
            config.ollama.model.clone(),
            timeout,
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{other}'"
        ))),
    }
}
