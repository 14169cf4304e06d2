//! Generation strategies: expanding a frontier state into candidates.

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::error::{ArborError, Result};
use crate::llm::CompletionRequest;
use crate::search::SearchCx;
use crate::thought::ThoughtState;

/// Produces candidate extensions of a state.
///
/// Must not mutate the input state; the only side effects are the
/// outbound model calls. A strategy that cannot produce candidates for a
/// state returns an empty vec, which the controller tolerates.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate up to `branching_factor` extensions of `state`.
    async fn generate(&self, cx: &SearchCx<'_>, state: &ThoughtState) -> Result<Vec<ThoughtState>>;
}

/// Independent sampling: one single-completion request per candidate
/// slot, all conditioned on the same rendered prompt.
///
/// Duplicate completions are kept; they simply compete again at
/// evaluation.
pub struct SampleGenerator {
    branching_factor: usize,
    temperature: f32,
    max_tokens: usize,
    stop_sequences: Vec<String>,
}

impl SampleGenerator {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            branching_factor: config.branching_factor,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stop_sequences: config.stop_sequences.clone(),
        }
    }
}

#[async_trait]
impl Generator for SampleGenerator {
    async fn generate(&self, cx: &SearchCx<'_>, state: &ThoughtState) -> Result<Vec<ThoughtState>> {
        let request = CompletionRequest::new(cx.task.generation_prompt(state))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_stop_sequences(self.stop_sequences.clone());

        let calls = (0..self.branching_factor).map(|_| {
            let request = &request;
            async move {
                let _permit = cx
                    .limiter
                    .acquire()
                    .await
                    .map_err(|_| ArborError::Other("concurrency limiter closed".to_string()))?;
                cx.provider.complete(request).await
            }
        });

        let mut candidates = Vec::with_capacity(self.branching_factor);
        for result in join_all(calls).await {
            match result {
                Ok(outputs) => {
                    if let Some(completion) = outputs.into_iter().next() {
                        let fragment = completion.trim_end();
                        if !fragment.is_empty() {
                            candidates.push(state.extend(fragment));
                        }
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(error = %e, "dropping failed sample"),
            }
        }

        Ok(candidates)
    }
}

/// Batch proposal: one request asking the model to enumerate up to
/// `branching_factor` distinct next steps.
///
/// A response that parses into fewer fragments than requested, or into
/// none at all, is tolerated silently; there is no retry.
pub struct ProposeGenerator {
    branching_factor: usize,
    temperature: f32,
    max_tokens: usize,
}

impl ProposeGenerator {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            branching_factor: config.branching_factor,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl Generator for ProposeGenerator {
    async fn generate(&self, cx: &SearchCx<'_>, state: &ThoughtState) -> Result<Vec<ThoughtState>> {
        let request = CompletionRequest::new(
            cx.task.proposal_prompt(state, self.branching_factor),
        )
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let _permit = cx
            .limiter
            .acquire()
            .await
            .map_err(|_| ArborError::Other("concurrency limiter closed".to_string()))?;

        let outputs = match cx.provider.complete(&request).await {
            Ok(outputs) => outputs,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "proposal call failed, yielding no candidates");
                return Ok(Vec::new());
            }
        };

        let raw = outputs.into_iter().next().unwrap_or_default();
        let mut fragments = cx.task.unwrap_proposals(&raw);
        if fragments.len() > self.branching_factor {
            fragments.truncate(self.branching_factor);
        }
        if fragments.is_empty() {
            debug!("proposal response parsed to zero fragments");
        }

        Ok(fragments
            .into_iter()
            .map(|fragment| state.extend(fragment))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMProvider, ModelInfo};
    use crate::search::cache::ValueCache;
    use crate::task::StepwiseTask;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    struct CountingProvider {
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: None,
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: Some(call),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for CountingProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Vec<String>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(call) {
                return Err(ArborError::Provider("scripted failure".to_string()));
            }
            Ok(vec![format!("step {}", call)])
        }

        fn model_info(&self) -> ModelInfo {
            ModelInfo {
                provider: "mock".to_string(),
                model_name: "test".to_string(),
            }
        }
    }

    struct ProposalProvider {
        response: String,
    }

    #[async_trait]
    impl LLMProvider for ProposalProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Vec<String>> {
            Ok(vec![self.response.clone()])
        }
    }

    fn config() -> SearchConfig {
        SearchConfig::default().with_branching_factor(3)
    }

    #[tokio::test]
    async fn test_sample_generator_produces_branching_factor_candidates() {
        let provider = CountingProvider::new();
        let task = StepwiseTask::new();
        let cache = ValueCache::new();
        let limiter = Semaphore::new(8);
        let cx = SearchCx {
            provider: &provider,
            task: &task,
            cache: &cache,
            limiter: &limiter,
        };

        let state = ThoughtState::root("problem");
        let generator = SampleGenerator::from_config(&config());
        let candidates = generator.generate(&cx, &state).await.unwrap();

        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| c.depth() == 1));
        // Input state is untouched.
        assert_eq!(state.depth(), 0);
    }

    #[tokio::test]
    async fn test_sample_generator_drops_failed_calls() {
        let provider = CountingProvider::failing_on(1);
        let task = StepwiseTask::new();
        let cache = ValueCache::new();
        let limiter = Semaphore::new(8);
        let cx = SearchCx {
            provider: &provider,
            task: &task,
            cache: &cache,
            limiter: &limiter,
        };

        let generator = SampleGenerator::from_config(&config());
        let candidates = generator
            .generate(&cx, &ThoughtState::root("p"))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn test_propose_generator_parses_fragments() {
        let provider = ProposalProvider {
            response: "1. first step\n2. second step".to_string(),
        };
        let task = StepwiseTask::new();
        let cache = ValueCache::new();
        let limiter = Semaphore::new(8);
        let cx = SearchCx {
            provider: &provider,
            task: &task,
            cache: &cache,
            limiter: &limiter,
        };

        let generator = ProposeGenerator::from_config(&config());
        let candidates = generator
            .generate(&cx, &ThoughtState::root("p"))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].trace(), ["first step".to_string()]);
    }

    #[tokio::test]
    async fn test_propose_generator_truncates_to_branching_factor() {
        let provider = ProposalProvider {
            response: "a\nb\nc\nd\ne".to_string(),
        };
        let task = StepwiseTask::new();
        let cache = ValueCache::new();
        let limiter = Semaphore::new(8);
        let cx = SearchCx {
            provider: &provider,
            task: &task,
            cache: &cache,
            limiter: &limiter,
        };

        let generator = ProposeGenerator::from_config(&config());
        let candidates = generator
            .generate(&cx, &ThoughtState::root("p"))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 3);
    }

    #[tokio::test]
    async fn test_propose_generator_tolerates_unparseable_response() {
        let provider = ProposalProvider {
            response: "\n   \n".to_string(),
        };
        let task = StepwiseTask::new();
        let cache = ValueCache::new();
        let limiter = Semaphore::new(8);
        let cx = SearchCx {
            provider: &provider,
            task: &task,
            cache: &cache,
            limiter: &limiter,
        };

        let generator = ProposeGenerator::from_config(&config());
        let candidates = generator
            .generate(&cx, &ThoughtState::root("p"))
            .await
            .unwrap();

        assert!(candidates.is_empty());
    }
}
