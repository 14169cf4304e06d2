//! Value cache: memoized promise scores for one search invocation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Memoizes evaluation results keyed by a state's rendered text.
///
/// Scoped to a single search invocation and shared across that search's
/// concurrent evaluation calls; never persisted or shared between
/// searches. Reusing a cached score for a non-deterministic model is a
/// deliberate approximation: identical prompts might legitimately earn
/// different ratings, and we trade that away for cost.
#[derive(Debug, Default)]
pub struct ValueCache {
    entries: Mutex<HashMap<String, f64>>,
    hits: AtomicU64,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously computed score.
    pub fn get(&self, key: &str) -> Option<f64> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let value = entries.get(key).copied();
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Store a computed score, keeping any value already present.
    ///
    /// First write wins so concurrent computations of the same key settle
    /// on one answer; returns the stored value.
    pub fn insert(&self, key: String, value: f64) -> f64 {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        *entries.entry(key).or_insert(value)
    }

    /// Number of distinct keys cached.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}
