//! Task prompt strategies: problem-specific prompting and output parsing.
//!
//! The search calls these through one fixed contract; swapping the
//! implementation adapts the engine to a new problem domain without
//! touching the algorithm.

use crate::parsing::{self, ParseResult};
use crate::thought::ThoughtState;

/// Renders the prompts the search issues and unwraps what comes back.
///
/// The default `unwrap_*` methods use the lenient parsers from
/// [`crate::parsing`]; override them when a domain needs stricter or
/// different output heuristics.
pub trait TaskPrompt: Send + Sync {
    /// Prompt for sampling one more reasoning fragment from a state.
    fn generation_prompt(&self, state: &ThoughtState) -> String;

    /// Prompt asking for up to `n` distinct next steps in one response.
    fn proposal_prompt(&self, state: &ThoughtState, n: usize) -> String;

    /// Prompt asking for a numeric promise rating of a state.
    fn value_prompt(&self, state: &ThoughtState) -> String;

    /// Prompt presenting all candidates and asking which is best.
    fn vote_prompt(&self, candidates: &[ThoughtState]) -> String;

    /// Extract a numeric score from a scoring response.
    fn unwrap_value(&self, raw: &str) -> ParseResult<f64> {
        parsing::parse_score(raw)
    }

    /// Extract a 0-based candidate index from a voting response.
    fn unwrap_vote(&self, raw: &str, n_candidates: usize) -> ParseResult<usize> {
        parsing::parse_vote(raw, n_candidates)
    }

    /// Split a batch proposal response into step fragments.
    fn unwrap_proposals(&self, raw: &str) -> Vec<String> {
        parsing::parse_proposals(raw)
    }
}

/// Generic step-by-step task prompting.
///
/// Domain-neutral chain-of-thought wrapping: the generation prompt asks
/// the model to continue the reasoning path one step at a time, and the
/// value prompt asks for a 0-1 promise rating.
#[derive(Debug, Clone, Default)]
pub struct StepwiseTask;

impl StepwiseTask {
    pub fn new() -> Self {
        Self
    }
}

impl TaskPrompt for StepwiseTask {
    fn generation_prompt(&self, state: &ThoughtState) -> String {
        if state.trace().is_empty() {
            format!("{}\nLet's solve this step-by-step:\n", state.problem())
        } else {
            format!(
                "{}\nLet's solve this step-by-step:\n{}\n",
                state.problem(),
                state.reasoning()
            )
        }
    }

    fn proposal_prompt(&self, state: &ThoughtState, n: usize) -> String {
        format!(
            "{}\nList up to {} distinct possible next steps, one per line.\n",
            self.generation_prompt(state).trim_end(),
            n
        )
    }

    fn value_prompt(&self, state: &ThoughtState) -> String {
        format!(
            "Rate the following reasoning path from 0 to 1, where 1 indicates the most promising path:\nProblem: {}\nReasoning: {}\nScore:",
            state.problem(),
            state.reasoning()
        )
    }

    fn vote_prompt(&self, candidates: &[ThoughtState]) -> String {
        let problem = candidates
            .first()
            .map(|c| c.problem().to_string())
            .unwrap_or_default();

        let mut prompt = format!(
            "Given the problem, decide which reasoning path is most promising.\nProblem: {}\n",
            problem
        );
        for (i, candidate) in candidates.iter().enumerate() {
            prompt.push_str(&format!("Choice {}:\n{}\n", i + 1, candidate.reasoning()));
        }
        prompt.push_str("Analyze each choice, then conclude with \"The best choice is N\".\n");
        prompt
    }
}
