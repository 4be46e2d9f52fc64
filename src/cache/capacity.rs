//! Capacity Controller
//!
//! Budget arithmetic and the pluggable policy that picks eviction victims.

use std::fmt::Debug;

use crate::cache::ScoredPage;

/// Number of lowest-scored candidates handed to the policy per eviction round.
pub const EVICTION_SCAN: usize = 16;

// == Eviction Policy ==
/// Chooses which page to evict when an upsert does not fit.
pub trait EvictionPolicy: Debug + Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Picks a victim among `candidates`, which arrive ordered by ascending
    /// frequency score. `protected` is the url being written and must not be
    /// chosen. None means nothing can be evicted.
    fn select_victim<'a>(
        &self,
        candidates: &'a [ScoredPage],
        protected: &str,
    ) -> Option<&'a ScoredPage>;
}

// == Least Frequent ==
/// Evicts the least accessed page; equal scores fall back to url order.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastFrequent;

impl EvictionPolicy for LeastFrequent {
    fn name(&self) -> &'static str {
        "least-frequent"
    }

    fn select_victim<'a>(
        &self,
        candidates: &'a [ScoredPage],
        protected: &str,
    ) -> Option<&'a ScoredPage> {
        candidates.iter().find(|page| page.url != protected)
    }
}

// == Budget ==
/// Byte budget check for one pending write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub capacity: u64,
}

impl Budget {
    pub fn new(capacity: u64) -> Self {
        Self { capacity }
    }

    /// Whether a single entry of `size` bytes could ever be admitted.
    pub fn admits(&self, size: u64) -> bool {
        size <= self.capacity
    }

    /// Usage after replacing `previous` bytes with `incoming` bytes.
    pub fn projected(used: u64, previous: u64, incoming: u64) -> u64 {
        used.saturating_sub(previous).saturating_add(incoming)
    }

    /// Whether the projected usage fits.
    pub fn fits(&self, used: u64, previous: u64, incoming: u64) -> bool {
        Self::projected(used, previous, incoming) <= self.capacity
    }
}
