//! Model-backend boundary: the capability the search consumes.
//!
//! The core never talks to a wire protocol directly. It asks an
//! [`LLMProvider`] for `n` independent completions of a prompt, or for a
//! single scoring/voting response, and parses whatever comes back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ArborError, Result};

pub mod factory;
pub mod providers;
pub mod retry;

pub use factory::ProviderFactory;
pub use retry::{RetryConfig, with_retry};

/// A request for one or more independent completions of a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The full prompt text
    pub prompt: String,

    /// Number of independent completions to return
    pub n: usize,

    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,

    /// Maximum tokens per completion
    pub max_tokens: usize,

    /// Markers that terminate a completion early
    pub stop_sequences: Vec<String>,
}

impl CompletionRequest {
    /// Create a request for a single completion with default sampling.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            n: 1,
            temperature: 0.7,
            max_tokens: 500,
            stop_sequences: Vec::new(),
        }
    }

    pub fn with_n(mut self, n: usize) -> Self {
        self.n = n.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = stop_sequences;
        self
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub provider: String,
    pub model_name: String,
}

/// Trait for model-backend implementations.
///
/// Implementors handle the actual calls (OpenAI, Ollama, a test mock).
/// Error contract: connection-level failures map to
/// [`ArborError::Backend`] and abort the search; anything else maps to
/// [`ArborError::Provider`] and degrades the affected candidate only.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Produce `request.n` independent completions of the prompt.
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>>;

    /// Produce a single scoring/voting response to parse.
    ///
    /// Default implementation requests one completion of the prompt.
    async fn score(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest::new(prompt);
        let outputs = self.complete(&request).await?;
        outputs
            .into_iter()
            .next()
            .ok_or_else(|| ArborError::Provider("provider returned no completions".to_string()))
    }

    /// Get model information
    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "unknown".to_string(),
            model_name: "unknown".to_string(),
        }
    }
}

/// Stub provider that always errors.
///
/// Lets the search wire up without a backend; callers must bring a real
/// [`LLMProvider`] implementation to run anything.
pub struct StubProvider;

#[async_trait]
impl LLMProvider for StubProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<Vec<String>> {
        Err(ArborError::Backend(
            "no model backend configured; implement the LLMProvider trait".to_string(),
        ))
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "stub".to_string(),
            model_name: "none".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl LLMProvider for EchoProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>> {
            Ok(vec![request.prompt.clone(); request.n])
        }
    }

    #[test]
    fn test_completion_request_builders() {
        let request = CompletionRequest::new("prompt")
            .with_n(3)
            .with_temperature(1.5)
            .with_max_tokens(64)
            .with_stop_sequences(vec!["\n".to_string()]);

        assert_eq!(request.n, 3);
        assert_eq!(request.temperature, 1.5);
        assert_eq!(request.max_tokens, 64);
        assert_eq!(request.stop_sequences, ["\n".to_string()]);
    }

    #[test]
    fn test_request_clamps() {
        let request = CompletionRequest::new("p").with_n(0).with_temperature(9.0);
        assert_eq!(request.n, 1);
        assert_eq!(request.temperature, 2.0);
    }

    #[tokio::test]
    async fn test_default_score_takes_first_completion() {
        let provider = EchoProvider;
        let response = provider.score("rate this").await.unwrap();
        assert_eq!(response, "rate this");
    }

    #[tokio::test]
    async fn test_stub_provider_errors() {
        let provider = StubProvider;
        let result = provider.complete(&CompletionRequest::new("x")).await;
        assert!(matches!(result, Err(ArborError::Backend(_))));
    }
}
