pub mod answer;
pub mod provider;
pub mod providers;

pub use answer::{Answer, AnswerGenerator, ANSWER_NOT_IN_CONTEXT};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
