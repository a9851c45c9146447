//! LLM provider selection and capability traits

pub mod completion;
pub mod embedding;
pub mod openai;

use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::types::ProviderConfig;

pub use completion::CompletionService;
pub use embedding::EmbeddingProvider;
pub use openai::OpenAiCompatibleClient;

/// Supported LLM providers.
///
/// The set is closed: names we recognize but have not implemented are
/// rejected at dispatch time instead of being sent a request that is bound
/// to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// OpenAI and OpenAI-protocol-compatible services
    OpenAi,
    Anthropic,
    Google,
}

impl Provider {
    /// Map a provider name to its variant; unknown names default to the
    /// OpenAI-compatible protocol.
    pub fn parse(name: &str) -> Self {
        match name {
            "anthropic" => Provider::Anthropic,
            "google" => Provider::Google,
            // "openai", "deepseek", and anything else speak the OpenAI protocol
            _ => Provider::OpenAi,
        }
    }
}

/// Build the completion service for a request's provider settings
pub fn completion_service(
    provider: &ProviderConfig,
    generation: &GenerationConfig,
) -> Result<Arc<dyn CompletionService>> {
    match Provider::parse(&provider.provider) {
        Provider::OpenAi => Ok(Arc::new(OpenAiCompatibleClient::new(provider, generation)?)),
        Provider::Anthropic => Err(Error::ProviderUnsupported("Anthropic".to_string())),
        Provider::Google => Err(Error::ProviderUnsupported("Google".to_string())),
    }
}

/// Build the embedding provider for a request's provider settings.
///
/// Embeddings always go through the OpenAI-compatible endpoint with the
/// caller's credentials, independent of the completion provider.
pub fn embedding_provider(
    provider: &ProviderConfig,
    generation: &GenerationConfig,
) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(OpenAiCompatibleClient::new(provider, generation)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: "key".to_string(),
            provider: name.to_string(),
            base_url: None,
            model: None,
        }
    }

    #[test]
    fn parse_known_and_unknown_names() {
        assert_eq!(Provider::parse("openai"), Provider::OpenAi);
        assert_eq!(Provider::parse("deepseek"), Provider::OpenAi);
        assert_eq!(Provider::parse("anthropic"), Provider::Anthropic);
        assert_eq!(Provider::parse("google"), Provider::Google);
        assert_eq!(Provider::parse("somebody-new"), Provider::OpenAi);
    }

    #[test]
    fn unimplemented_providers_fail_before_any_request() {
        let generation = GenerationConfig::default();
        for name in ["anthropic", "google"] {
            match completion_service(&config(name), &generation) {
                Err(Error::ProviderUnsupported(_)) => {}
                other => panic!("expected ProviderUnsupported, got {:?}", other.is_ok()),
            }
        }
    }

    #[test]
    fn openai_dispatch_succeeds() {
        let generation = GenerationConfig::default();
        let service = completion_service(&config("openai"), &generation).unwrap();
        assert_eq!(service.model(), "gpt-3.5-turbo");
    }
}
