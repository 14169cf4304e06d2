//! Selection strategies: reducing the scored pool to the next frontier.

use std::cmp::Ordering;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SearchConfig;
use crate::search::trace::CandidateScore;
use crate::thought::ThoughtState;

/// Picks the subset of scored candidates to keep for the next round.
pub trait Selector: Send + Sync {
    /// Return at most `keep` states from `scored`.
    fn select(&self, scored: &[CandidateScore], keep: usize) -> Vec<ThoughtState>;
}

/// Greedy selection: top `keep` by score, stable on ties so the
/// earliest-generated candidate wins. Fully deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySelector;

impl GreedySelector {
    pub fn new() -> Self {
        Self
    }
}

impl Selector for GreedySelector {
    fn select(&self, scored: &[CandidateScore], keep: usize) -> Vec<ThoughtState> {
        let mut order: Vec<usize> = (0..scored.len()).collect();
        // Stable sort: equal scores keep generation order.
        order.sort_by(|&a, &b| {
            scored[b]
                .score
                .partial_cmp(&scored[a].score)
                .unwrap_or(Ordering::Equal)
        });

        order
            .into_iter()
            .take(keep)
            .map(|i| scored[i].state.clone())
            .collect()
    }
}

/// Weighted sampling without replacement, probability proportional to
/// score.
///
/// When every remaining candidate scores zero the draw degrades to
/// uniform, so an all-zero pool still yields a frontier instead of a
/// divide-by-zero dead end. Supply a seed for reproducible runs.
pub struct WeightedSelector {
    rng: Mutex<StdRng>,
}

impl WeightedSelector {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.seed)
    }
}

impl Selector for WeightedSelector {
    fn select(&self, scored: &[CandidateScore], keep: usize) -> Vec<ThoughtState> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let mut remaining: Vec<usize> = (0..scored.len()).collect();
        let mut selected = Vec::with_capacity(keep.min(scored.len()));

        while selected.len() < keep && !remaining.is_empty() {
            let total: f64 = remaining.iter().map(|&i| scored[i].score.max(0.0)).sum();

            let pick = if total <= 0.0 {
                rng.gen_range(0..remaining.len())
            } else {
                let mut target = rng.r#gen::<f64>() * total;
                let mut pick = None;
                for (slot, &i) in remaining.iter().enumerate() {
                    let weight = scored[i].score.max(0.0);
                    if weight <= 0.0 {
                        continue;
                    }
                    target -= weight;
                    if target < 0.0 {
                        pick = Some(slot);
                        break;
                    }
                }
                // Float residue lands on the last positive-weight slot.
                pick.unwrap_or_else(|| {
                    remaining
                        .iter()
                        .enumerate()
                        .rev()
                        .find(|&(_, &i)| scored[i].score > 0.0)
                        .map(|(slot, _)| slot)
                        .unwrap_or(0)
                })
            };

            let index = remaining.swap_remove(pick);
            selected.push(scored[index].state.clone());
        }

        selected
    }
}
