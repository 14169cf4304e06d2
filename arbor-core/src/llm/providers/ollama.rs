//! Ollama model-backend provider (local models)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ArborError, Result};
use crate::llm::retry::{RetryConfig, with_retry};
use crate::llm::{CompletionRequest, LLMProvider, ModelInfo};

/// Ollama provider (local, free, runs on your machine).
///
/// The generate endpoint returns one completion per call, so `n`
/// independent samples are issued as `n` sequential requests.
pub struct OllamaProvider {
    client: reqwest::Client,
    model: String,
    base_url: String,
    retry: RetryConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    ///
    /// `base_url` defaults to "http://localhost:11434" when `None`.
    pub fn new(model: impl Into<String>, base_url: Option<impl Into<String>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            base_url: base_url
                .map(|u| u.into())
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            retry: RetryConfig::default(),
        }
    }

    /// Create from environment variables.
    ///
    /// Reads `OLLAMA_MODEL` (optional, defaults to "qwen3:14b") and
    /// `OLLAMA_BASE_URL` (optional).
    pub fn from_env(model: Option<impl Into<String>>) -> Result<Self> {
        let model = model
            .map(|m| m.into())
            .or_else(|| std::env::var("OLLAMA_MODEL").ok())
            .unwrap_or_else(|| "qwen3:14b".to_string());

        let base_url = std::env::var("OLLAMA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());

        Ok(Self::new(model, Some(base_url)))
    }

    /// Override the retry policy for transient HTTP failures.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_once(&self, request: &CompletionRequest) -> std::result::Result<String, CallError> {
        let wire_request = WireRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            stream: false,
            options: WireOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                stop: if request.stop_sequences.is_empty() {
                    None
                } else {
                    Some(request.stop_sequences.clone())
                },
            },
        };

        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&wire_request)
            .send()
            .await
            .map_err(CallError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(CallError::Status(status.as_u16(), body));
        }

        let wire_response: WireResponse = response
            .json()
            .await
            .map_err(|e| CallError::Decode(e.to_string()))?;

        Ok(wire_response.response)
    }
}

#[derive(Debug)]
enum CallError {
    Transport(reqwest::Error),
    Status(u16, String),
    Decode(String),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Transport(e) => write!(f, "transport error: {}", e),
            CallError::Status(status, message) => write!(f, "HTTP {}: {}", status, message),
            CallError::Decode(message) => write!(f, "decode error: {}", message),
        }
    }
}

#[derive(Serialize)]
struct WireRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: WireOptions,
}

#[derive(Serialize)]
struct WireOptions {
    temperature: f32,
    num_predict: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct WireResponse {
    response: String,
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>> {
        let retryable = |e: &CallError| match e {
            CallError::Transport(_) => true,
            CallError::Status(status, _) => self.retry.is_retryable_status(*status),
            CallError::Decode(_) => false,
        };

        let mut outputs = Vec::with_capacity(request.n);
        for _ in 0..request.n {
            let output = with_retry(&self.retry, retryable, || self.call_once(request))
                .await
                .map_err(|e| match e {
                    CallError::Transport(inner) => {
                        ArborError::Backend(format!("Ollama unreachable: {}", inner))
                    }
                    other => ArborError::Provider(format!("Ollama call failed: {}", other)),
                })?;
            outputs.push(output);
        }

        Ok(outputs)
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "ollama".to_string(),
            model_name: self.model.clone(),
        }
    }
}
