//! Thought states: immutable partial solutions explored by the search.

use serde::{Deserialize, Serialize};

/// An immutable partial solution: the original problem plus the reasoning
/// fragments accumulated so far.
///
/// A `ThoughtState` is never mutated after creation. Extending one produces
/// a new state whose trace is the parent's trace plus one fragment, which
/// makes states safely shareable across concurrent evaluation calls and
/// cacheable by their rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThoughtState {
    problem: String,
    trace: Vec<String>,
}

impl ThoughtState {
    /// Create the root state for a problem (empty trace).
    pub fn root(problem: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            trace: Vec::new(),
        }
    }

    /// The original task description.
    pub fn problem(&self) -> &str {
        &self.problem
    }

    /// The reasoning fragments appended so far, in insertion order.
    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    /// Number of reasoning steps taken from the root.
    pub fn depth(&self) -> usize {
        self.trace.len()
    }

    /// Produce a child state with one more reasoning fragment.
    pub fn extend(&self, fragment: impl Into<String>) -> Self {
        let mut trace = self.trace.clone();
        trace.push(fragment.into());
        Self {
            problem: self.problem.clone(),
            trace,
        }
    }

    /// The reasoning path as a single block of text, one fragment per line.
    pub fn reasoning(&self) -> String {
        self.trace.join("\n")
    }

    /// The full prompt text for this state: the problem followed by the
    /// reasoning path. This is also the canonical cache key for scoring.
    pub fn rendered(&self) -> String {
        if self.trace.is_empty() {
            self.problem.clone()
        } else {
            format!("{}\n{}", self.problem, self.reasoning())
        }
    }
}
