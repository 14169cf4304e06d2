//! End-to-end search scenarios against scripted providers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::config::{EvaluationMode, GenerationMode, SearchConfig, SelectionMode};
use crate::error::Result;
use crate::llm::{CompletionRequest, LLMProvider, ModelInfo};
use crate::search::bfs::BfsSearch;
use crate::thought::ThoughtState;

/// Generation pops scripted completions per call; scoring answers by
/// looking the reasoning path up in a fixed table.
struct ScriptedProvider {
    completions: Mutex<VecDeque<String>>,
    ratings: Vec<(&'static str, &'static str)>,
    votes: Mutex<VecDeque<String>>,
    score_calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(completions: &[&str]) -> Self {
        Self {
            completions: Mutex::new(completions.iter().map(|s| s.to_string()).collect()),
            ratings: Vec::new(),
            votes: Mutex::new(VecDeque::new()),
            score_calls: AtomicUsize::new(0),
        }
    }

    fn with_ratings(mut self, ratings: &[(&'static str, &'static str)]) -> Self {
        self.ratings = ratings.to_vec();
        self
    }

    fn with_votes(self, votes: &[&str]) -> Self {
        *self.votes.lock().unwrap() = votes.iter().map(|s| s.to_string()).collect();
        self
    }

    fn is_scoring_prompt(prompt: &str) -> bool {
        prompt.starts_with("Rate the following") || prompt.starts_with("Given the problem")
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>> {
        if Self::is_scoring_prompt(&request.prompt) {
            self.score_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(vote) = self.votes.lock().unwrap().pop_front() {
                return Ok(vec![vote]);
            }

            let response = self
                .ratings
                .iter()
                .find(|&&(fragment, _)| request.prompt.contains(fragment))
                .map(|(_, rating)| rating.to_string())
                .unwrap_or_else(|| "0.0".to_string());
            return Ok(vec![response; request.n]);
        }

        let mut completions = self.completions.lock().unwrap();
        let mut outputs = Vec::with_capacity(request.n);
        for _ in 0..request.n {
            outputs.push(completions.pop_front().unwrap_or_default());
        }
        Ok(outputs)
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "scripted".to_string(),
            model_name: "test".to_string(),
        }
    }
}

fn search(provider: ScriptedProvider, config: SearchConfig) -> (Arc<ScriptedProvider>, BfsSearch) {
    let provider = Arc::new(provider);
    let search = BfsSearch::builder()
        .provider(provider.clone())
        .config(config)
        .build()
        .unwrap();
    (provider, search)
}

#[tokio::test]
async fn test_greedy_single_step_picks_best_candidate() {
    // problem "2+2?", two candidates "=4" and "=5"; direct scoring rates
    // "=4" at 1.0 and "=5" at 0.0; greedy keeps one.
    let provider = ScriptedProvider::new(&["=4", "=5"])
        .with_ratings(&[("=4", "1.0"), ("=5", "0.0")]);
    let config = SearchConfig::default()
        .with_steps(1)
        .with_branching_factor(2)
        .with_n_evaluate_sample(1)
        .with_n_select_sample(1)
        .with_max_concurrency(1);

    let (_, search) = search(provider, config);
    let outcome = search.run("2+2?").await.unwrap();

    assert_eq!(outcome.final_outputs, vec!["2+2?\n=4".to_string()]);
    assert!(outcome.is_complete());
    assert_eq!(outcome.trace.len(), 1);
}

#[tokio::test]
async fn test_trace_has_one_record_per_round() {
    let provider = ScriptedProvider::new(&["alpha", "beta", "gamma", "delta", "zeta", "theta"])
        .with_ratings(&[("alpha", "0.9"), ("beta", "0.4")]);
    let config = SearchConfig::default()
        .with_steps(2)
        .with_branching_factor(2)
        .with_n_evaluate_sample(1)
        .with_n_select_sample(2)
        .with_max_concurrency(1);

    let (_, search) = search(provider, config);
    let outcome = search.run("p").await.unwrap();

    assert_eq!(outcome.trace.len(), 2);
    assert!(outcome.is_complete());
    for (i, record) in outcome.trace.rounds.iter().enumerate() {
        assert_eq!(record.round, i);
    }
}

#[tokio::test]
async fn test_frontier_and_pool_sizes_stay_bounded() {
    let completions: Vec<&str> = vec!["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"];
    let provider = ScriptedProvider::new(&completions).with_ratings(&[("a", "0.5")]);
    let config = SearchConfig::default()
        .with_steps(2)
        .with_branching_factor(3)
        .with_n_evaluate_sample(1)
        .with_n_select_sample(2)
        .with_max_concurrency(1);

    let (_, search) = search(provider, config);
    let outcome = search.run("p").await.unwrap();

    for record in &outcome.trace.rounds {
        assert!(record.pool.len() <= record.frontier.len() * 3);
        assert!(record.selected.len() <= 2);
    }
    // Round 0 starts from the root alone.
    assert_eq!(outcome.trace.rounds[0].frontier.len(), 1);
    assert!(outcome.final_outputs.len() <= 2);
}

#[tokio::test]
async fn test_empty_pool_terminates_early_without_error() {
    // Every completion is blank, so generation yields zero candidates.
    let provider = ScriptedProvider::new(&["", ""]);
    let config = SearchConfig::default()
        .with_steps(3)
        .with_branching_factor(2)
        .with_n_evaluate_sample(1)
        .with_n_select_sample(1)
        .with_max_concurrency(1);

    let (_, search) = search(provider, config);
    let outcome = search.run("p").await.unwrap();

    assert!(outcome.final_outputs.is_empty());
    assert_eq!(outcome.trace.len(), 1);
    assert!(outcome.trace.early_terminated);
    assert!(!outcome.is_complete());
}

#[tokio::test]
async fn test_voting_tallies_across_candidates() {
    // Two candidates, three votes [A, A, B] → A scores 2, B scores 1.
    let provider = ScriptedProvider::new(&["left", "right"]).with_votes(&[
        "The best choice is 1",
        "The best choice is 1",
        "The best choice is 2",
    ]);
    let config = SearchConfig::default()
        .with_steps(1)
        .with_branching_factor(2)
        .with_n_evaluate_sample(3)
        .with_n_select_sample(2)
        .with_evaluation_mode(EvaluationMode::Voting)
        .with_max_concurrency(1);

    let (_, search) = search(provider, config);
    let outcome = search.run("p").await.unwrap();

    let pool = &outcome.trace.rounds[0].pool;
    let score_of = |fragment: &str| {
        pool.iter()
            .find(|c| c.state.trace()[0] == fragment)
            .map(|c| c.score)
            .unwrap()
    };
    assert_eq!(score_of("left"), 2.0);
    assert_eq!(score_of("right"), 1.0);
    // Vote winner leads the greedy selection.
    assert_eq!(outcome.trace.rounds[0].selected[0].trace(), ["left"]);
}

#[tokio::test]
async fn test_identical_candidates_score_once() {
    // Both samples return the same fragment; the rendered text is scored
    // by a single call.
    let provider =
        ScriptedProvider::new(&["same", "same"]).with_ratings(&[("same", "0.8")]);
    let config = SearchConfig::default()
        .with_steps(1)
        .with_branching_factor(2)
        .with_n_evaluate_sample(1)
        .with_n_select_sample(2)
        .with_max_concurrency(1);

    let (provider, search) = search(provider, config);
    let outcome = search.run("p").await.unwrap();

    assert_eq!(provider.score_calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.trace.rounds[0].pool.len(), 2);
    assert_eq!(outcome.trace.rounds[0].pool[0].score, 0.8);
    assert_eq!(outcome.trace.rounds[0].pool[1].score, 0.8);
}

#[tokio::test]
async fn test_greedy_runs_are_identical() {
    let run = || async {
        let provider = ScriptedProvider::new(&["red", "blue", "green", "cyan"])
            .with_ratings(&[("red", "0.3"), ("blue", "0.7"), ("green", "0.5")]);
        let config = SearchConfig::default()
            .with_steps(2)
            .with_branching_factor(2)
            .with_n_evaluate_sample(1)
            .with_n_select_sample(1)
            .with_max_concurrency(1);

        let (_, search) = search(provider, config);
        search.run("p").await.unwrap()
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first.final_outputs, second.final_outputs);
    assert_eq!(first.trace.len(), second.trace.len());
}

#[tokio::test]
async fn test_weighted_selection_reproducible_with_seed() {
    let run = || async {
        let provider = ScriptedProvider::new(&["north", "south", "east", "west"]).with_ratings(&[
            ("north", "0.2"),
            ("south", "0.5"),
            ("east", "0.9"),
            ("west", "0.4"),
        ]);
        let config = SearchConfig::default()
            .with_steps(1)
            .with_branching_factor(4)
            .with_n_evaluate_sample(1)
            .with_n_select_sample(2)
            .with_selection_mode(SelectionMode::Weighted)
            .with_seed(1234)
            .with_max_concurrency(1);

        let (_, search) = search(provider, config);
        search.run("p").await.unwrap()
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first.final_outputs, second.final_outputs);
}

#[tokio::test]
async fn test_zero_scored_candidate_never_outranks_positive() {
    // "bad" has no rating entry and falls back to 0.0; "good" rates 0.1.
    let provider = ScriptedProvider::new(&["bad", "good"]).with_ratings(&[("good", "0.1")]);
    let config = SearchConfig::default()
        .with_steps(1)
        .with_branching_factor(2)
        .with_n_evaluate_sample(1)
        .with_n_select_sample(1)
        .with_max_concurrency(1);

    let (_, search) = search(provider, config);
    let outcome = search.run("p").await.unwrap();

    assert_eq!(outcome.final_outputs, vec!["p\ngood".to_string()]);
}

#[tokio::test]
async fn test_batch_proposal_mode_end_to_end() {
    // One proposal call enumerates both next steps.
    let provider = ScriptedProvider::new(&["1. add\n2. carry"])
        .with_ratings(&[("add", "0.9"), ("carry", "0.2")]);
    let config = SearchConfig::default()
        .with_steps(1)
        .with_branching_factor(2)
        .with_n_evaluate_sample(1)
        .with_n_select_sample(1)
        .with_generation_mode(GenerationMode::Batch)
        .with_max_concurrency(1);

    let (_, search) = search(provider, config);
    let outcome = search.run("p").await.unwrap();

    assert_eq!(outcome.trace.rounds[0].pool.len(), 2);
    assert_eq!(outcome.final_outputs, vec!["p\nadd".to_string()]);
}

#[tokio::test]
async fn test_states_are_immutable_across_rounds() {
    let provider = ScriptedProvider::new(&["one", "two", "three", "four"])
        .with_ratings(&[("one", "0.9")]);
    let config = SearchConfig::default()
        .with_steps(2)
        .with_branching_factor(2)
        .with_n_evaluate_sample(1)
        .with_n_select_sample(1)
        .with_max_concurrency(1);

    let (_, search) = search(provider, config);
    let outcome = search.run("p").await.unwrap();

    // The round-0 record still shows the root frontier untouched.
    assert_eq!(outcome.trace.rounds[0].frontier, vec![ThoughtState::root("p")]);
    // Depth grows by exactly one fragment per round.
    for record in &outcome.trace.rounds {
        for candidate in &record.pool {
            assert_eq!(candidate.state.depth(), record.round + 1);
        }
    }
}
