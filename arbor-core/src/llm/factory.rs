//! Factory for creating model-backend providers from configuration

use std::sync::Arc;

use crate::config::{LLMProviderConfig, LLMProviderKind};
use crate::error::Result;
use crate::llm::LLMProvider;
use crate::llm::providers::{OllamaProvider, OpenAIProvider};

/// Factory for creating LLM providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be created (e.g., missing
    /// API key for OpenAI).
    pub fn create(config: &LLMProviderConfig) -> Result<Arc<dyn LLMProvider>> {
        match config.provider {
            LLMProviderKind::OpenAI => {
                let model = if config.model.is_empty() {
                    None
                } else {
                    Some(config.model.clone())
                };

                let provider = if let Some(api_key) = &config.api_key {
                    let model = model.unwrap_or_else(|| "gpt-4o".to_string());
                    if let Some(base_url) = &config.base_url {
                        OpenAIProvider::with_base_url(api_key.clone(), model, base_url.clone())
                    } else {
                        OpenAIProvider::new(api_key.clone(), model)
                    }
                } else {
                    OpenAIProvider::from_env(model)?
                };

                Ok(Arc::new(provider))
            }

            LLMProviderKind::Ollama => {
                let model = if config.model.is_empty() {
                    None
                } else {
                    Some(config.model.clone())
                };

                let provider = if let Some(base_url) = &config.base_url {
                    OllamaProvider::new(
                        model.unwrap_or_else(|| "qwen3:14b".to_string()),
                        Some(base_url.clone()),
                    )
                } else {
                    OllamaProvider::from_env(model)?
                };

                Ok(Arc::new(provider))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama() {
        let config = LLMProviderConfig {
            provider: LLMProviderKind::Ollama,
            model: "llama3".to_string(),
            api_key: None,
            base_url: Some("http://localhost:11434".to_string()),
        };

        let provider = ProviderFactory::create(&config).unwrap();
        assert_eq!(provider.model_info().provider, "ollama");
        assert_eq!(provider.model_info().model_name, "llama3");
    }

    #[test]
    fn test_create_openai_with_key() {
        let config = LLMProviderConfig {
            provider: LLMProviderKind::OpenAI,
            model: "gpt-4o".to_string(),
            api_key: Some("test-key".to_string()),
            base_url: None,
        };

        let provider = ProviderFactory::create(&config).unwrap();
        assert_eq!(provider.model_info().provider, "openai");
    }
}
