//! Page Entry Module
//!
//! Defines the record written by an upsert and the metadata the store keeps per page.

use bytes::Bytes;
use serde::Serialize;

// == Page Entry ==
/// A page submitted for caching.
#[derive(Debug, Clone)]
pub struct PageEntry {
    /// Unique key of the page
    pub url: String,
    /// Opaque page content
    pub content: Bytes,
    /// Absolute expiry (Unix seconds), None = now + the engine's default TTL
    pub ttl: Option<i64>,
    /// Bytes charged against the capacity budget (content + url)
    pub total_size: u64,
}

impl PageEntry {
    // == Constructor ==
    /// Creates a new page entry, computing its accounted size.
    ///
    /// # Arguments
    /// * `url` - The key to store the page under
    /// * `content` - The page body
    /// * `ttl` - Optional absolute expiry timestamp in seconds
    pub fn new(url: impl Into<String>, content: impl Into<Bytes>, ttl: Option<i64>) -> Self {
        let url = url.into();
        let content = content.into();
        let total_size = (content.len() + url.len()) as u64;

        Self {
            url,
            content,
            ttl,
            total_size,
        }
    }

    // == Expires At ==
    /// Resolves the absolute expiry, falling back to `now + default_ttl`.
    /// Saturates at `i64::MAX` for TTLs too large to add.
    pub fn expires_at(&self, default_ttl: u64) -> i64 {
        self.ttl.unwrap_or_else(|| {
            current_timestamp().saturating_add(i64::try_from(default_ttl).unwrap_or(i64::MAX))
        })
    }
}

// == Page Meta ==
/// Metadata of a live page as seen by a watching transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// Accounted size (content + url)
    pub size: u64,
    /// Absolute expiry timestamp
    pub expires_at: i64,
}

// == Scored Page ==
/// A url with its frequency score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredPage {
    pub url: String,
    pub score: u64,
}

impl ScoredPage {
    pub fn new(url: impl Into<String>, score: u64) -> Self {
        Self {
            url: url.into(),
            score,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
