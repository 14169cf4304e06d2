//! Configuration types for the arbor search engine

use serde::{Deserialize, Serialize};

use crate::error::{ArborError, Result};

/// Top-level configuration: search parameters plus an optional
/// model-backend description for the factory.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArborConfig {
    /// Search parameters
    #[serde(default)]
    pub search: SearchConfig,

    /// LLM provider configuration (optional; callers may also construct
    /// a provider directly)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LLMProviderConfig>,
}

impl ArborConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (arbor.toml or path from ARBOR_CONFIG_PATH)
    /// 3. Environment variable overrides (`ARBOR_`-prefixed)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is invalid or the
    /// resulting search parameters fail validation.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Toml},
        };

        let mut figment = Figment::new()
            .merge(Toml::file("arbor.toml"))
            .merge(Env::prefixed("ARBOR_").split("_"));

        if let Ok(path) = std::env::var("ARBOR_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: ArborConfig = figment
            .extract()
            .map_err(|e| ArborError::Configuration(format!("Failed to load configuration: {}", e)))?;

        config.search.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Toml},
        };

        let config: ArborConfig = Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| {
                ArborError::Configuration(format!("Failed to load configuration file: {}", e))
            })?;

        config.search.validate()?;
        Ok(config)
    }
}

/// How candidate extensions are produced each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Separate single-completion requests per candidate slot
    Independent,
    /// One request enumerating up to `branching_factor` next steps
    Batch,
}

/// How the candidate pool is scored each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    /// Per-candidate scoring prompts, averaged over repeated samples
    Direct,
    /// Repeated votes across the whole pool; score = vote count
    Voting,
}

/// How the scored pool is reduced to the next frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Top-k by score, stable on ties
    Greedy,
    /// Sampling without replacement, probability proportional to score
    Weighted,
}

/// Parameters for a single search invocation.
///
/// Missing fields fall back to their defaults, so partial config files
/// and env overrides compose.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Reasoning depth: number of BFS rounds
    pub steps: usize,

    /// Candidates generated per frontier state per round
    pub branching_factor: usize,

    /// Repeated scoring/voting calls per evaluation
    pub n_evaluate_sample: usize,

    /// Frontier size retained after each round
    pub n_select_sample: usize,

    /// Generation strategy
    pub generation_mode: GenerationMode,

    /// Evaluation strategy
    pub evaluation_mode: EvaluationMode,

    /// Selection strategy
    pub selection_mode: SelectionMode,

    /// Sampling temperature passed through to generation (0.0-2.0)
    pub temperature: f32,

    /// Maximum tokens per completion
    pub max_tokens: usize,

    /// Markers that terminate a single completion early
    #[serde(default)]
    pub stop_sequences: Vec<String>,

    /// Seed for weighted selection; `None` draws from entropy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Cap on concurrent model calls within a round
    pub max_concurrency: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            steps: 3,
            branching_factor: 3,
            n_evaluate_sample: 3,
            n_select_sample: 3,
            generation_mode: GenerationMode::Independent,
            evaluation_mode: EvaluationMode::Direct,
            selection_mode: SelectionMode::Greedy,
            temperature: 0.7,
            max_tokens: 500,
            stop_sequences: Vec::new(),
            seed: None,
            max_concurrency: 8,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_branching_factor(mut self, branching_factor: usize) -> Self {
        self.branching_factor = branching_factor;
        self
    }

    pub fn with_n_evaluate_sample(mut self, n: usize) -> Self {
        self.n_evaluate_sample = n;
        self
    }

    pub fn with_n_select_sample(mut self, n: usize) -> Self {
        self.n_select_sample = n;
        self
    }

    pub fn with_generation_mode(mut self, mode: GenerationMode) -> Self {
        self.generation_mode = mode;
        self
    }

    pub fn with_evaluation_mode(mut self, mode: EvaluationMode) -> Self {
        self.evaluation_mode = mode;
        self
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
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

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Reject invalid parameters before any model call is issued.
    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(ArborError::Configuration(
                "steps must be positive".to_string(),
            ));
        }
        if self.branching_factor == 0 {
            return Err(ArborError::Configuration(
                "branching_factor must be positive".to_string(),
            ));
        }
        if self.n_evaluate_sample == 0 {
            return Err(ArborError::Configuration(
                "n_evaluate_sample must be positive".to_string(),
            ));
        }
        if self.n_select_sample == 0 {
            return Err(ArborError::Configuration(
                "n_select_sample must be positive".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ArborError::Configuration(
                "max_concurrency must be positive".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ArborError::Configuration(format!(
                "temperature must be in 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Provider type
    pub provider: LLMProviderKind,

    /// Model name
    pub model: String,

    /// API key (if needed, prefer env vars)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL (for custom endpoints, e.g., Ollama)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProviderKind {
    OpenAI,
    Ollama,
}
