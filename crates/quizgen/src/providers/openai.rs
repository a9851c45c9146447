//! OpenAI-compatible chat and embedding client with retry logic
//!
//! Covers the official OpenAI API and protocol-compatible services
//! (DeepSeek, Qwen, GLM, and similar) selected via the base URL.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::types::ProviderConfig;

use super::completion::CompletionService;
use super::embedding::EmbeddingProvider;

/// System message constraining generation to the supplied context
const GROUNDING_SYSTEM_PROMPT: &str = "You are a teaching assistant working from a \
knowledge base. Answer questions or create quiz items using ONLY the reference \
context provided in the prompt. If the context does not contain the answer, say \
so directly. Always cite the supporting pages of the reference context in the \
form [Page X].";

/// Formatting instruction appended to every generation prompt
const FORMAT_INSTRUCTION: &str = "IMPORTANT: You must respond with a valid JSON \
object containing a \"questions\" array. Do not include markdown formatting \
(like ```json). Each object in the array should have: \"type\" (string), \
\"content\" (string), \"options\" (array of strings, if applicable), \
\"correctAnswer\" (string), \"explanation\" (string).";

/// OpenAI-compatible API client
pub struct OpenAiCompatibleClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
    temperature: f32,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Failure classification for the transport retry loop
enum CallFailure {
    /// Network error, timeout, 429, or 5xx; worth retrying
    Transient(String),
    /// Definitive API rejection (4xx); retrying the same request is pointless
    Fatal(String),
}

impl OpenAiCompatibleClient {
    pub fn new(provider: &ProviderConfig, generation: &GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(generation.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: provider.api_key.clone(),
            base_url: provider.base_url().trim_end_matches('/').to_string(),
            model: provider.model().to_string(),
            embedding_model: generation.embedding_model.clone(),
            temperature: generation.temperature,
            max_retries: generation.max_retries,
        })
    }

    /// Whether the model is known to accept `response_format: json_object`.
    ///
    /// Only official OpenAI model families are assumed to; other
    /// OpenAI-protocol services often reject the parameter, and skipping it
    /// up front avoids a wasted round trip.
    fn supports_json_mode(model: &str) -> bool {
        model.starts_with("gpt-") || model.starts_with("o1-")
    }

    async fn chat_completion(&self, messages: Vec<ChatMessage>, json_mode: bool) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let mut attempt = 0u32;
        loop {
            match self.send_chat(&request).await {
                Ok(content) => return Ok(content),
                Err(CallFailure::Transient(message)) if attempt < self.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Chat request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt,
                        self.max_retries + 1,
                        delay,
                        message
                    );
                    sleep(delay).await;
                }
                Err(CallFailure::Transient(message)) | Err(CallFailure::Fatal(message)) => {
                    return Err(Error::Llm(message));
                }
            }
        }
    }

    async fn send_chat(
        &self,
        request: &ChatCompletionRequest,
    ) -> std::result::Result<String, CallFailure> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CallFailure::Transient(format!("Chat request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Chat completion failed: HTTP {} - {}", status, body);
            return if is_transient_status(status) {
                Err(CallFailure::Transient(message))
            } else {
                Err(CallFailure::Fatal(message))
            };
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            CallFailure::Transient(format!("Failed to parse chat response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CallFailure::Fatal("Chat response contained no content".to_string()))
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl CompletionService for OpenAiCompatibleClient {
    async fn generate_quiz(&self, prompt: &str) -> Result<String> {
        let final_prompt = format!("{}\n\n{}", prompt, FORMAT_INSTRUCTION);
        let messages = || {
            vec![
                ChatMessage {
                    role: "system",
                    content: GROUNDING_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: final_prompt.clone(),
                },
            ]
        };

        if Self::supports_json_mode(&self.model) {
            match self.chat_completion(messages(), true).await {
                Ok(content) => Ok(content),
                Err(e) => {
                    // Some gateways reject json_object even for gpt- models;
                    // retry once with the option dropped, same messages.
                    tracing::warn!(
                        "Chat call with json_object failed, retrying without it: {}",
                        e
                    );
                    self.chat_completion(messages(), false).await
                }
            }
        } else {
            self.chat_completion(messages(), false).await
        }
    }

    async fn chat(&self, system_prompt: &str, user_query: &str) -> Result<String> {
        let messages = vec![
            ChatMessage {
                role: "system",
                content: system_prompt.to_string(),
            },
            ChatMessage {
                role: "user",
                content: user_query.to_string(),
            },
        ];
        self.chat_completion(messages, false).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::llm("Embedding response was empty"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "Embedding failed: HTTP {} - {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse embedding response: {}", e)))?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_mode_heuristic_matches_openai_families() {
        assert!(OpenAiCompatibleClient::supports_json_mode("gpt-4o"));
        assert!(OpenAiCompatibleClient::supports_json_mode("gpt-3.5-turbo"));
        assert!(OpenAiCompatibleClient::supports_json_mode("o1-mini"));
        assert!(!OpenAiCompatibleClient::supports_json_mode("deepseek-chat"));
        assert!(!OpenAiCompatibleClient::supports_json_mode("glm-4"));
        assert!(!OpenAiCompatibleClient::supports_json_mode("qwen-turbo"));
    }

    #[test]
    fn transient_statuses() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
        assert!(!is_transient_status(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = ProviderConfig {
            api_key: "k".to_string(),
            provider: "openai".to_string(),
            base_url: Some("http://localhost:1234/v1/".to_string()),
            model: None,
        };
        let client =
            OpenAiCompatibleClient::new(&provider, &GenerationConfig::default()).unwrap();
        assert_eq!(client.base_url, "http://localhost:1234/v1");
    }
}
