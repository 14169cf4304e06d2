//! Tree-of-thoughts breadth-first search.
//!
//! The controller in [`bfs`] drives rounds of generate → evaluate →
//! select over a frontier of [`crate::thought::ThoughtState`]s. Each
//! role is a strategy chosen by configuration at search start:
//! generation ([`generate`]), evaluation ([`evaluate`], backed by the
//! [`cache`]), and selection ([`select`]). Per-round records live in
//! [`trace`].

use tokio::sync::Semaphore;

use crate::llm::LLMProvider;
use crate::task::TaskPrompt;

pub mod bfs;
pub mod cache;
pub mod evaluate;
pub mod generate;
pub mod select;
pub mod trace;

#[cfg(test)]
mod tests;

pub use bfs::{BfsSearch, BfsSearchBuilder};
pub use cache::ValueCache;
pub use evaluate::{Evaluator, ValueEvaluator, VoteEvaluator};
pub use generate::{Generator, ProposeGenerator, SampleGenerator};
pub use select::{GreedySelector, Selector, WeightedSelector};
pub use trace::{CandidateScore, RoundTrace, SearchOutcome, SearchTrace};

/// Shared context for one search round's model calls.
///
/// Bundles the capabilities a strategy needs: the backend, the task
/// prompts, the per-search value cache, and the concurrency limiter
/// capping in-flight calls within the round.
pub struct SearchCx<'a> {
    pub provider: &'a dyn LLMProvider,
    pub task: &'a dyn TaskPrompt,
    pub cache: &'a ValueCache,
    pub limiter: &'a Semaphore,
}
