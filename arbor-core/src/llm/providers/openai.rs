//! OpenAI model-backend provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ArborError, Result};
use crate::llm::retry::{RetryConfig, with_retry};
use crate::llm::{CompletionRequest, LLMProvider, ModelInfo};

/// OpenAI provider (GPT-4 family and compatible endpoints).
///
/// Uses the chat-completions endpoint's native `n` parameter to get
/// independent samples in one round trip.
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    retry: RetryConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Create with a custom base URL (Azure OpenAI or compatible APIs).
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new(api_key, model)
        }
    }

    /// Override the retry policy for transient HTTP failures.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Create from environment variables.
    ///
    /// Reads `OPENAI_API_KEY` (required), `OPENAI_MODEL` (optional,
    /// defaults to "gpt-4o") and `OPENAI_BASE_URL` (optional).
    ///
    /// # Errors
    ///
    /// Returns an error if OPENAI_API_KEY is not set.
    pub fn from_env(model: Option<impl Into<String>>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ArborError::Configuration("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let model = model
            .map(|m| m.into())
            .or_else(|| std::env::var("OPENAI_MODEL").ok())
            .unwrap_or_else(|| "gpt-4o".to_string());

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Ok(Self {
            base_url,
            ..Self::new(api_key, model)
        })
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(&self, request: &CompletionRequest) -> std::result::Result<Vec<String>, CallError> {
        let wire_request = WireRequest {
            model: self.model.clone(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            n: request.n,
            stop: if request.stop_sequences.is_empty() {
                None
            } else {
                Some(request.stop_sequences.clone())
            },
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
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
            let message = match serde_json::from_str::<WireError>(&body) {
                Ok(wire) => wire.error.message,
                Err(_) => body,
            };
            return Err(CallError::Status(status.as_u16(), message));
        }

        let wire_response: WireResponse = response
            .json()
            .await
            .map_err(|e| CallError::Decode(e.to_string()))?;

        if wire_response.choices.is_empty() {
            return Err(CallError::Decode("response contained no choices".to_string()));
        }

        Ok(wire_response
            .choices
            .into_iter()
            .map(|choice| choice.message.content.unwrap_or_default())
            .collect())
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
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: usize,
    n: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessageResponse,
}

#[derive(Deserialize)]
struct WireMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireError {
    error: WireErrorDetail,
}

#[derive(Deserialize)]
struct WireErrorDetail {
    message: String,
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>> {
        let retryable = |e: &CallError| match e {
            CallError::Transport(_) => true,
            CallError::Status(status, _) => self.retry.is_retryable_status(*status),
            CallError::Decode(_) => false,
        };

        with_retry(&self.retry, retryable, || self.call(request))
            .await
            .map_err(|e| match e {
                CallError::Transport(inner) => {
                    ArborError::Backend(format!("OpenAI unreachable: {}", inner))
                }
                other => ArborError::Provider(format!("OpenAI call failed: {}", other)),
            })
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "openai".to_string(),
            model_name: self.model.clone(),
        }
    }
}
