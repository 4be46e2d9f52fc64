//! Conflict Retry Policy
//!
//! Governs how optimistic transactions react to a concurrent modification of their key.

use std::time::Duration;

// == Retry Policy ==
/// Retry limits and backoff for conflicting transactions.
///
/// The default retries forever without sleeping: contention is resolved by
/// re-running the transaction, never by queueing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed per operation, None = unbounded
    pub max_attempts: Option<u32>,
    /// Sleep after the first conflict, doubled per further conflict
    pub base_backoff: Duration,
    /// Upper bound for the doubled sleep
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RetryPolicy {
    /// Retries until commit, with no backoff.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Gives up after `max_attempts` conflicting attempts.
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            ..Self::unbounded()
        }
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max.max(base);
        self
    }

    // == Exhausted ==
    /// True once `attempts` conflicting attempts used up the budget.
    pub fn exhausted(&self, attempts: u32) -> bool {
        matches!(self.max_attempts, Some(max) if attempts >= max)
    }

    // == Backoff ==
    /// Sleep before attempt `attempts + 1`, where `attempts` >= 1 have conflicted.
    pub fn backoff(&self, attempts: u32) -> Duration {
        if self.base_backoff.is_zero() {
            return Duration::ZERO;
        }
        let shift = attempts.saturating_sub(1).min(16);
        self.base_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}
