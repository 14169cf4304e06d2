//! Search observability: per-round records and the final outcome.
//!
//! The trace is returned to the caller for inspection and never consulted
//! by the algorithm itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::thought::ThoughtState;

/// A candidate paired with its promise score.
///
/// Score range depends on the evaluation strategy: an averaged rating for
/// direct scoring, a vote count for voting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub state: ThoughtState,
    pub score: f64,
}

/// Record of one search round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundTrace {
    /// Round index (0-based)
    pub round: usize,

    /// Frontier entering the round
    pub frontier: Vec<ThoughtState>,

    /// Candidate pool with scores, in generation order
    pub pool: Vec<CandidateScore>,

    /// Subset selected as the next frontier
    pub selected: Vec<ThoughtState>,
}

/// Ordered per-round records for a whole search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchTrace {
    /// One record per completed round, in round order
    pub rounds: Vec<RoundTrace>,

    /// True when the search stopped before `steps` rounds (empty pool or
    /// cancellation)
    pub early_terminated: bool,
}

impl SearchTrace {
    /// Number of rounds recorded.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

/// Result of a search invocation: final outputs plus the full trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Identifier for this search run
    pub run_id: Uuid,

    /// Rendered texts of the final frontier
    pub final_outputs: Vec<String>,

    /// Step-by-step trace
    pub trace: SearchTrace,

    /// Wall-clock duration of the search
    pub duration_ms: u64,
}

impl SearchOutcome {
    /// Whether every configured round ran to completion.
    pub fn is_complete(&self) -> bool {
        !self.trace.early_terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_round_count() {
        let mut trace = SearchTrace::default();
        assert!(trace.is_empty());

        trace.rounds.push(RoundTrace {
            round: 0,
            frontier: vec![ThoughtState::root("p")],
            pool: Vec::new(),
            selected: Vec::new(),
        });
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn test_outcome_serializes() {
        let outcome = SearchOutcome {
            run_id: Uuid::new_v4(),
            final_outputs: vec!["p\n=4".to_string()],
            trace: SearchTrace::default(),
            duration_ms: 12,
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["final_outputs"][0], "p\n=4");
    }
}
