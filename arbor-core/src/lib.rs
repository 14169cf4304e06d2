//! # Arbor - Tree-of-Thoughts Search over a Language-Model Backend
//!
//! Arbor explores a tree of partial solutions ("thoughts") instead of
//! generating one linear completion. Each round it expands a frontier of
//! candidates, scores them for promise, and keeps only the best before
//! reasoning one step deeper:
//! - Breadth-first search with pluggable generation / evaluation /
//!   selection strategies
//! - Per-search value cache so identical reasoning paths are scored once
//! - Intra-round concurrency with strictly sequential rounds
//! - Cancellation that returns the best frontier found so far
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use arbor_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let provider = Arc::new(OpenAIProvider::from_env(None::<String>)?);
//!
//!     let search = BfsSearch::builder()
//!         .provider(provider)
//!         .config(SearchConfig::default().with_steps(3))
//!         .build()?;
//!
//!     let outcome = search.run("What is 24 using 4, 9, 10, 13?").await?;
//!     for output in &outcome.final_outputs {
//!         println!("{output}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The search controller ([`search::bfs::BfsSearch`]) owns the round
//! loop. Strategies are chosen by [`config::SearchConfig`] at search
//! start: independent sampling or batch proposal for generation, direct
//! scoring or voting for evaluation, greedy or seeded-weighted sampling
//! for selection. Problem-specific prompting plugs in through
//! [`task::TaskPrompt`], and model backends through
//! [`llm::LLMProvider`].

pub mod config;
pub mod error;
pub mod llm;
pub mod parsing;
pub mod search;
pub mod task;
pub mod thought;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        ArborConfig, EvaluationMode, GenerationMode, LLMProviderConfig, LLMProviderKind,
        SearchConfig, SelectionMode,
    };
    pub use crate::error::{ArborError, Result};
    pub use crate::llm::{
        CompletionRequest, LLMProvider, ModelInfo, ProviderFactory, RetryConfig, StubProvider,
        providers::{OllamaProvider, OpenAIProvider},
    };
    pub use crate::parsing::{ParseError, ParseResult};
    pub use crate::search::{
        BfsSearch, BfsSearchBuilder, CandidateScore, Evaluator, Generator, GreedySelector,
        ProposeGenerator, RoundTrace, SampleGenerator, SearchOutcome, SearchTrace, Selector,
        ValueCache, ValueEvaluator, VoteEvaluator, WeightedSelector,
    };
    pub use crate::task::{StepwiseTask, TaskPrompt};
    pub use crate::thought::ThoughtState;
}
