//! BFS search controller: rounds of generate → evaluate → select.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{EvaluationMode, GenerationMode, SearchConfig, SelectionMode};
use crate::error::{ArborError, Result};
use crate::llm::LLMProvider;
use crate::search::SearchCx;
use crate::search::cache::ValueCache;
use crate::search::evaluate::{Evaluator, ValueEvaluator, VoteEvaluator};
use crate::search::generate::{Generator, ProposeGenerator, SampleGenerator};
use crate::search::select::{GreedySelector, Selector, WeightedSelector};
use crate::search::trace::{CandidateScore, RoundTrace, SearchOutcome, SearchTrace};
use crate::task::{StepwiseTask, TaskPrompt};
use crate::thought::ThoughtState;

/// Breadth-first search over a tree of partial solutions.
///
/// Holds a frontier of [`ThoughtState`]s and runs `steps` rounds: every
/// frontier state is expanded into candidates, the whole pool is scored
/// once (sharing the value cache and enabling cross-candidate voting),
/// and the pool is pruned back to frontier size. Rounds are strictly
/// sequential; calls within a round run concurrently up to
/// `max_concurrency`.
pub struct BfsSearch {
    provider: Arc<dyn LLMProvider>,
    task: Arc<dyn TaskPrompt>,
    config: SearchConfig,
}

impl BfsSearch {
    /// Create a builder.
    pub fn builder() -> BfsSearchBuilder {
        BfsSearchBuilder::new()
    }

    /// Create a search over the given provider with the default
    /// step-by-step task prompts.
    pub fn new(provider: Arc<dyn LLMProvider>, config: SearchConfig) -> Self {
        Self {
            provider,
            task: Arc::new(StepwiseTask::new()),
            config,
        }
    }

    /// The search configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run the search to completion.
    pub async fn run(&self, problem: &str) -> Result<SearchOutcome> {
        self.run_with_cancellation(problem, CancellationToken::new())
            .await
    }

    /// Run the search, stopping early when `cancel` fires.
    ///
    /// Cancellation stops issuing further model calls and returns the
    /// best frontier obtained so far as a degraded-but-successful
    /// outcome, never an error.
    pub async fn run_with_cancellation(
        &self,
        problem: &str,
        cancel: CancellationToken,
    ) -> Result<SearchOutcome> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let started = Instant::now();

        let generator: Box<dyn Generator> = match self.config.generation_mode {
            GenerationMode::Independent => Box::new(SampleGenerator::from_config(&self.config)),
            GenerationMode::Batch => Box::new(ProposeGenerator::from_config(&self.config)),
        };
        let evaluator: Box<dyn Evaluator> = match self.config.evaluation_mode {
            EvaluationMode::Direct => Box::new(ValueEvaluator::from_config(&self.config)),
            EvaluationMode::Voting => Box::new(VoteEvaluator::from_config(&self.config)),
        };
        let selector: Box<dyn Selector> = match self.config.selection_mode {
            SelectionMode::Greedy => Box::new(GreedySelector::new()),
            SelectionMode::Weighted => Box::new(WeightedSelector::from_config(&self.config)),
        };

        let cache = ValueCache::new();
        let limiter = Semaphore::new(self.config.max_concurrency);
        let cx = SearchCx {
            provider: self.provider.as_ref(),
            task: self.task.as_ref(),
            cache: &cache,
            limiter: &limiter,
        };

        let mut frontier = vec![ThoughtState::root(problem)];
        let mut trace = SearchTrace::default();

        for round in 0..self.config.steps {
            if cancel.is_cancelled() {
                debug!(round, "search cancelled before round start");
                trace.early_terminated = true;
                break;
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.round(&cx, round, &frontier, generator.as_ref(), evaluator.as_ref(), selector.as_ref()) => {
                    Some(result?)
                }
            };

            let Some((record, next_frontier)) = outcome else {
                debug!(round, "search cancelled mid-round, keeping previous frontier");
                trace.early_terminated = true;
                break;
            };

            let pool_empty = record.pool.is_empty();
            trace.rounds.push(record);
            frontier = next_frontier;

            if pool_empty {
                warn!(round, "candidate pool empty, terminating search early");
                trace.early_terminated = true;
                break;
            }
        }

        let final_outputs: Vec<String> = frontier.iter().map(ThoughtState::rendered).collect();
        info!(
            %run_id,
            rounds = trace.len(),
            outputs = final_outputs.len(),
            cache_entries = cache.len(),
            cache_hits = cache.hits(),
            early = trace.early_terminated,
            "search finished"
        );

        Ok(SearchOutcome {
            run_id,
            final_outputs,
            trace,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// One round: expand every frontier state, score the pooled
    /// candidates, select the next frontier.
    async fn round(
        &self,
        cx: &SearchCx<'_>,
        round: usize,
        frontier: &[ThoughtState],
        generator: &dyn Generator,
        evaluator: &dyn Evaluator,
        selector: &dyn Selector,
    ) -> Result<(RoundTrace, Vec<ThoughtState>)> {
        // Expand every frontier state; pool order is generation order so
        // selection tie-breaks stay deterministic.
        let expansions =
            futures::future::join_all(frontier.iter().map(|state| generator.generate(cx, state)))
                .await;

        let mut pool = Vec::new();
        for expansion in expansions {
            pool.extend(expansion?);
        }

        if pool.is_empty() {
            let record = RoundTrace {
                round,
                frontier: frontier.to_vec(),
                pool: Vec::new(),
                selected: Vec::new(),
            };
            return Ok((record, Vec::new()));
        }

        debug!(round, pool = pool.len(), "evaluating candidate pool");
        let scores = evaluator.evaluate(cx, &pool).await?;

        let scored: Vec<CandidateScore> = pool
            .into_iter()
            .zip(scores)
            .map(|(state, score)| CandidateScore { state, score })
            .collect();

        let selected = selector.select(&scored, self.config.n_select_sample);

        let record = RoundTrace {
            round,
            frontier: frontier.to_vec(),
            pool: scored,
            selected: selected.clone(),
        };

        Ok((record, selected))
    }
}

/// Builder for [`BfsSearch`]
pub struct BfsSearchBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    task: Arc<dyn TaskPrompt>,
    config: SearchConfig,
}

impl BfsSearchBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            task: Arc::new(StepwiseTask::new()),
            config: SearchConfig::default(),
        }
    }

    /// Set the model backend (required).
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the task prompt strategy (defaults to [`StepwiseTask`]).
    pub fn task(mut self, task: Arc<dyn TaskPrompt>) -> Self {
        self.task = task;
        self
    }

    /// Set the search configuration.
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the search.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no provider was set or the
    /// search parameters are invalid.
    pub fn build(self) -> Result<BfsSearch> {
        let provider = self.provider.ok_or_else(|| {
            ArborError::Configuration("a model provider is required".to_string())
        })?;
        self.config.validate()?;

        Ok(BfsSearch {
            provider,
            task: self.task,
            config: self.config,
        })
    }
}

impl Default for BfsSearchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionRequest, ModelInfo, StubProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NeverCalledProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LLMProvider for NeverCalledProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["x".to_string()])
        }

        fn model_info(&self) -> ModelInfo {
            ModelInfo {
                provider: "mock".to_string(),
                model_name: "test".to_string(),
            }
        }
    }

    #[test]
    fn test_builder_requires_provider() {
        let result = BfsSearch::builder().build();
        assert!(matches!(result, Err(ArborError::Configuration(_))));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = BfsSearch::builder()
            .provider(Arc::new(StubProvider))
            .config(SearchConfig::default().with_steps(0))
            .build();
        assert!(matches!(result, Err(ArborError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_any_model_call() {
        let provider = Arc::new(NeverCalledProvider {
            calls: AtomicUsize::new(0),
        });

        let search = BfsSearch {
            provider: provider.clone(),
            task: Arc::new(StepwiseTask::new()),
            config: SearchConfig::default().with_n_select_sample(0),
        };

        let result = search.run("p").await;
        assert!(matches!(result, Err(ArborError::Configuration(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_is_fatal() {
        let search = BfsSearch::builder()
            .provider(Arc::new(StubProvider))
            .config(SearchConfig::default().with_steps(1))
            .build()
            .unwrap();

        let result = search.run("p").await;
        assert!(matches!(result, Err(ArborError::Backend(_))));
    }

    #[tokio::test]
    async fn test_pre_cancelled_search_returns_root_frontier() {
        let provider = Arc::new(NeverCalledProvider {
            calls: AtomicUsize::new(0),
        });
        let search = BfsSearch::builder()
            .provider(provider.clone())
            .config(SearchConfig::default().with_steps(2))
            .build()
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = search.run_with_cancellation("2+2?", cancel).await.unwrap();
        assert!(outcome.trace.early_terminated);
        assert!(outcome.trace.is_empty());
        assert_eq!(outcome.final_outputs, vec!["2+2?".to_string()]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
