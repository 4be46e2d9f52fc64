//! Expiry Index Module
//!
//! Ordered key → absolute expiry timestamp map scanned by the expiry sweep.

use std::collections::{BTreeSet, HashMap};

// == Expiry Index ==
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    deadlines: HashMap<String, i64>,
    ordered: BTreeSet<(i64, String)>,
}

impl ExpiryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Sets the expiry of `key`, replacing any previous deadline.
    pub fn set(&mut self, key: &str, expires_at: i64) {
        if let Some(previous) = self.deadlines.insert(key.to_string(), expires_at) {
            self.ordered.remove(&(previous, key.to_string()));
        }
        self.ordered.insert((expires_at, key.to_string()));
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Option<i64> {
        let expires_at = self.deadlines.remove(key)?;
        self.ordered.remove(&(expires_at, key.to_string()));
        Some(expires_at)
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.deadlines.get(key).copied()
    }

    // == Due ==
    /// Keys whose deadline is at or before `now`, earliest first.
    pub fn due(&self, now: i64) -> Vec<String> {
        self.ordered
            .iter()
            .take_while(|(expires_at, _)| *expires_at <= now)
            .map(|(_, key)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
