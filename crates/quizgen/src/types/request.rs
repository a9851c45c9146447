//! Request bodies for the HTTP API

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_PROVIDER: &str = "openai";

/// LLM provider connection settings, supplied per request by the caller
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key for the provider
    pub api_key: String,
    /// Provider name (`openai` when unset)
    pub provider: String,
    /// Base URL override for OpenAI-protocol-compatible services
    pub base_url: Option<String>,
    /// Model name override
    pub model: Option<String>,
}

impl ProviderConfig {
    /// Effective base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Effective model name
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Optional persona hints injected into the generation prompt
#[derive(Debug, Clone, Default)]
pub struct Persona {
    /// Subject-matter domain the model should present expertise in
    pub domain: Option<String>,
    /// Target audience description
    pub role: Option<String>,
    /// Requested difficulty level
    pub difficulty: Option<String>,
}

impl Persona {
    /// Render the persona introduction prepended to generation prompts.
    ///
    /// Absent fields contribute nothing.
    pub fn intro(&self) -> String {
        let mut intro = String::from("You are a helpful AI tutor.");

        if let Some(domain) = &self.domain {
            intro.push_str(&format!(" You are an expert in {}.", domain));
        }
        if let Some(role) = &self.role {
            intro.push_str(&format!(
                " Your target audience is a {}. Adjust your tone and complexity accordingly.",
                role
            ));
        }
        if let Some(difficulty) = &self.difficulty {
            intro.push_str(&format!(
                " Please generate questions with {} difficulty level.",
                difficulty
            ));
        }

        intro
    }
}

/// Body of `POST /api/quiz/generate`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    #[serde(default)]
    pub pdf_ids: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub type_counts: Option<BTreeMap<String, u32>>,
    pub quantity: Option<u32>,
    pub custom_requirements: Option<String>,
    pub api_key: Option<String>,
    pub provider: Option<String>,
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub domain: Option<String>,
    pub role: Option<String>,
    pub difficulty: Option<String>,
}

impl GenerateQuizRequest {
    /// Check required fields, mirroring the HTTP contract: `pdfIds`,
    /// `types`, and `apiKey` must all be present and non-empty.
    pub fn validate(&self) -> Result<()> {
        let api_key_missing = self.api_key.as_deref().map_or(true, str::is_empty);
        if self.pdf_ids.is_empty() || self.types.is_empty() || api_key_missing {
            return Err(Error::validation("Missing required parameters"));
        }
        Ok(())
    }

    /// Provider settings extracted from the request
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            provider: self
                .provider
                .clone()
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
        }
    }

    /// Persona hints extracted from the request
    pub fn persona(&self) -> Persona {
        Persona {
            domain: self.domain.clone(),
            role: self.role.clone(),
            difficulty: self.difficulty.clone(),
        }
    }
}

/// Body of `POST /api/quiz/chat`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The quiz question being discussed, passed through verbatim
    pub question: Option<Value>,
    pub user_query: Option<String>,
    pub pdf_id: Option<String>,
    pub api_key: Option<String>,
    pub provider: Option<String>,
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<()> {
        let question_missing = self.question.as_ref().map_or(true, Value::is_null);
        let query_missing = self.user_query.as_deref().map_or(true, str::is_empty);
        let api_key_missing = self.api_key.as_deref().map_or(true, str::is_empty);
        if question_missing || query_missing || api_key_missing {
            return Err(Error::validation("Missing required parameters"));
        }
        Ok(())
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            provider: self
                .provider
                .clone()
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
        }
    }
}

/// Body of `POST /api/system/prompt`
#[derive(Debug, Deserialize)]
pub struct SavePromptRequest {
    pub prompt: Option<String>,
    #[serde(rename = "type")]
    pub prompt_type: Option<String>,
}
