//! Cache Module
//!
//! The page cache engine: frequency and expiry indices, capacity-driven
//! eviction and optimistic per-page transactions.

mod capacity;
mod engine;
mod entry;
mod expiry;
mod frequency;
mod retry;
mod stats;


// Re-export public types
pub use capacity::{Budget, EvictionPolicy, LeastFrequent, EVICTION_SCAN};
pub use engine::CacheEngine;
pub use entry::{current_timestamp, PageEntry, PageMeta, ScoredPage};
pub use expiry::ExpiryIndex;
pub use frequency::FrequencyIndex;
pub use retry::RetryPolicy;
pub use stats::{CacheStats, StatsSnapshot};

// == Public Constants ==
/// Maximum allowed url length in bytes
pub const MAX_URL_LENGTH: usize = 2048;

/// Maximum allowed page content size in bytes
pub const MAX_CONTENT_SIZE: usize = 1024 * 1024; // 1 MB
