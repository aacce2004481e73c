//! Grounded answer synthesis: all retrieved passages are stuffed into a
//! single prompt together with the question.

use std::sync::Arc;

use pdfchat_core::{Config, RetryPolicy};
use tracing::{debug, info};

use crate::provider::{LlmError, LlmProvider, Message};
use crate::providers::create_provider;

/// Exact reply the model is told to give when the passages do not contain
/// the answer.
pub const ANSWER_NOT_IN_CONTEXT: &str = "ANSWER_NOT_IN_CONTEXT";

const SYSTEM_PROMPT: &str = "You answer questions about the user's documents. \
Answer the question as thoroughly as possible using only the provided context. \
Do not use outside knowledge and do not guess. \
If the answer is not contained in the context, reply with exactly \
ANSWER_NOT_IN_CONTEXT and nothing else.";

/// Outcome of one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Trimmed model reply.
    Generated(String),
    /// The passages did not contain the answer, or there were none.
    Insufficient,
    /// The model replied with no text.
    Empty,
}

impl Answer {
    /// Text shown to the user.
    pub fn display_text(&self) -> &str {
        match self {
            Answer::Generated(text) => text,
            Answer::Insufficient => "The answer is not available in the provided documents.",
            Answer::Empty => "No answer generated",
        }
    }
}

pub struct AnswerGenerator {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl AnswerGenerator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        temperature: f32,
        max_tokens: u32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
            retry,
        }
    }

    /// Generator for the provider selected by `LLM_PROVIDER`.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Ok(Self::new(
            create_provider(config)?,
            config.llm.temperature,
            config.llm.max_tokens,
            config.network.retry_policy(),
        ))
    }

    /// Answer `question` from `passages` only.
    ///
    /// With no passages the provider is not called. Transient provider
    /// failures are retried; anything else is returned as-is.
    pub async fn answer(&self, question: &str, passages: &[&str]) -> Result<Answer, LlmError> {
        if passages.is_empty() {
            debug!("No passages retrieved; skipping generation");
            return Ok(Answer::Insufficient);
        }

        let messages = build_messages(question, passages);
        debug!(
            "Generating answer: model={} passages={} temperature={}",
            self.provider.model_name(),
            passages.len(),
            self.temperature
        );

        let reply = self
            .retry
            .run("generation", LlmError::is_transient, || {
                self.provider
                    .complete(messages.clone(), self.temperature, self.max_tokens)
            })
            .await?;

        let answer = interpret_reply(&reply);
        info!(
            "Generated answer: {} chars, {}",
            reply.trim().chars().count(),
            match &answer {
                Answer::Generated(_) => "grounded",
                Answer::Insufficient => "not in context",
                Answer::Empty => "empty",
            }
        );
        Ok(answer)
    }
}

/// System instructions plus one user message with numbered passages and
/// the question.
pub fn build_messages(question: &str, passages: &[&str]) -> Vec<Message> {
    let mut context = String::new();
    for (i, passage) in passages.iter().enumerate() {
        if i > 0 {
            context.push_str("\n\n");
        }
        context.push_str(&format!("[{}]\n{}", i + 1, passage.trim()));
    }
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!(
            "Context:\n{context}\n\nQuestion:\n{}\n\nAnswer:",
            question.trim()
        )),
    ]
}

fn interpret_reply(reply: &str) -> Answer {
    let text = reply.trim();
    if text.is_empty() {
        Answer::Empty
    } else if text.starts_with(ANSWER_NOT_IN_CONTEXT) {
        Answer::Insufficient
    } else {
        Answer::Generated(text.to_string())
    }
}
