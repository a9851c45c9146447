//! Completion service trait for quiz generation and chat

use async_trait::async_trait;

use crate::error::Result;

/// Capability interface every supported LLM provider implements.
///
/// One instance is built per request from caller-supplied credentials and
/// discarded afterwards.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run one quiz-generation batch and return the raw response text.
    ///
    /// The implementation appends the strict JSON formatting instruction
    /// and the grounding system message; parsing the result is the
    /// normalizer's job.
    async fn generate_quiz(&self, prompt: &str) -> Result<String>;

    /// Answer a free-form follow-up question under the given system prompt
    async fn chat(&self, system_prompt: &str, user_query: &str) -> Result<String>;

    /// Model name used for requests
    fn model(&self) -> &str;
}
