//! Frequency Index Module
//!
//! Access-count ranking used for top-N queries and eviction victim selection.

use std::collections::{BTreeSet, HashMap};

use crate::cache::ScoredPage;

// == Frequency Index ==
/// Ordered map of key → access count.
///
/// Scores live twice: in `scores` for O(1) lookup and in `ranked` ordered by
/// `(score, key)`, so both ends of the ranking are reachable in O(log N).
#[derive(Debug, Default)]
pub struct FrequencyIndex {
    scores: HashMap<String, u64>,
    ranked: BTreeSet<(u64, String)>,
}

impl FrequencyIndex {
    // == Constructor ==
    /// Creates a new empty frequency index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Increment ==
    /// Adds one to the score of `key`, creating it with score 1 if absent.
    ///
    /// Returns the new score.
    pub fn increment(&mut self, key: &str) -> u64 {
        let score = match self.scores.get_mut(key) {
            Some(score) => {
                self.ranked.remove(&(*score, key.to_string()));
                *score += 1;
                *score
            }
            None => {
                self.scores.insert(key.to_string(), 1);
                1
            }
        };
        self.ranked.insert((score, key.to_string()));
        score
    }

    // == Remove ==
    /// Drops `key` from the index, returning its last score.
    pub fn remove(&mut self, key: &str) -> Option<u64> {
        let score = self.scores.remove(key)?;
        self.ranked.remove(&(score, key.to_string()));
        Some(score)
    }

    // == Score ==
    /// Current score of `key`.
    pub fn score(&self, key: &str) -> Option<u64> {
        self.scores.get(key).copied()
    }

    // == Top ==
    /// The `n` highest scores, descending. Equal scores come in descending key order.
    pub fn top(&self, n: usize) -> Vec<ScoredPage> {
        self.ranked
            .iter()
            .rev()
            .take(n)
            .map(|(score, key)| ScoredPage::new(key.clone(), *score))
            .collect()
    }

    // == Lowest ==
    /// The `n` lowest scores, ascending. Equal scores come in ascending key order.
    pub fn lowest(&self, n: usize) -> Vec<ScoredPage> {
        self.ranked
            .iter()
            .take(n)
            .map(|(score, key)| ScoredPage::new(key.clone(), *score))
            .collect()
    }

    // == Length ==
    /// Returns the number of ranked keys.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
