//! Evaluation strategies: scoring the candidate pool for promise.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::error::{ArborError, Result};
use crate::search::SearchCx;
use crate::thought::ThoughtState;

/// Assigns a numeric promise score to every candidate in the pool.
///
/// Scores are non-negative. A candidate that cannot be scored at all
/// defaults to 0.0, making it eligible for pruning without failing the
/// round.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Score the pool; the returned vec is parallel to `pool`.
    async fn evaluate(&self, cx: &SearchCx<'_>, pool: &[ThoughtState]) -> Result<Vec<f64>>;
}

/// Direct scoring: per-candidate rating prompts, averaged over
/// `n_samples` responses, memoized in the value cache.
///
/// Duplicate candidates in the pool share one scoring batch, and a state
/// seen again in a later round reuses its cached average outright.
pub struct ValueEvaluator {
    n_samples: usize,
}

impl ValueEvaluator {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            n_samples: config.n_evaluate_sample,
        }
    }

    async fn score_state(&self, cx: &SearchCx<'_>, state: &ThoughtState) -> Result<f64> {
        let prompt = cx.task.value_prompt(state);

        let calls = (0..self.n_samples).map(|_| {
            let prompt = &prompt;
            async move {
                let _permit = cx
                    .limiter
                    .acquire()
                    .await
                    .map_err(|_| ArborError::Other("concurrency limiter closed".to_string()))?;
                cx.provider.score(prompt).await
            }
        });

        let mut total = 0.0;
        for result in join_all(calls).await {
            match result {
                Ok(raw) => match cx.task.unwrap_value(&raw) {
                    Ok(value) => total += value.max(0.0),
                    Err(e) => debug!(error = %e, "unparseable score contributes zero"),
                },
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(error = %e, "failed scoring call contributes zero"),
            }
        }

        Ok(total / self.n_samples as f64)
    }
}

#[async_trait]
impl Evaluator for ValueEvaluator {
    async fn evaluate(&self, cx: &SearchCx<'_>, pool: &[ThoughtState]) -> Result<Vec<f64>> {
        // One scoring batch per distinct rendered text: duplicates within
        // the pool coalesce here, repeats across rounds hit the cache.
        let mut seen = HashSet::new();
        let mut missing = Vec::new();
        for state in pool {
            let key = state.rendered();
            if seen.insert(key.clone()) && cx.cache.get(&key).is_none() {
                missing.push((key, state));
            }
        }

        let computed = join_all(
            missing
                .iter()
                .map(|(_, state)| self.score_state(cx, state)),
        )
        .await;

        for ((key, _), result) in missing.into_iter().zip(computed) {
            let value = result?;
            cx.cache.insert(key, value);
        }

        Ok(pool
            .iter()
            .map(|state| cx.cache.get(&state.rendered()).unwrap_or(0.0))
            .collect())
    }
}

/// Voting: repeated prompts presenting the whole pool and asking which
/// candidate is best; a candidate's score is its vote count.
///
/// Votes that fail to parse are dropped silently and count for no one.
pub struct VoteEvaluator {
    n_samples: usize,
}

impl VoteEvaluator {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            n_samples: config.n_evaluate_sample,
        }
    }
}

#[async_trait]
impl Evaluator for VoteEvaluator {
    async fn evaluate(&self, cx: &SearchCx<'_>, pool: &[ThoughtState]) -> Result<Vec<f64>> {
        if pool.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = cx.task.vote_prompt(pool);

        let calls = (0..self.n_samples).map(|_| {
            let prompt = &prompt;
            async move {
                let _permit = cx
                    .limiter
                    .acquire()
                    .await
                    .map_err(|_| ArborError::Other("concurrency limiter closed".to_string()))?;
                cx.provider.score(prompt).await
            }
        });

        let mut votes = vec![0usize; pool.len()];
        for result in join_all(calls).await {
            match result {
                Ok(raw) => match cx.task.unwrap_vote(&raw, pool.len()) {
                    Ok(index) => votes[index] += 1,
                    Err(e) => debug!(error = %e, "dropping unparseable vote"),
                },
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(error = %e, "dropping failed vote call"),
            }
        }

        Ok(votes.into_iter().map(|count| count as f64).collect())
    }
}
