//! Response DTOs for the page cache API
//!
//! Defines the structure of outgoing JSON response bodies.

use serde::Serialize;

use crate::cache::{ScoredPage, StatsSnapshot};

/// Response body for PUT /pages
#[derive(Debug, Clone, Serialize)]
pub struct UpsertResponse {
    /// The page url
    pub url: String,
    /// True when the page content was newly created
    pub changed: bool,
}

impl UpsertResponse {
    pub fn new(url: impl Into<String>, changed: bool) -> Self {
        Self {
            url: url.into(),
            changed,
        }
    }
}

/// Response body for DELETE /pages
#[derive(Debug, Clone, Serialize)]
pub struct RemoveResponse {
    /// The removed page url
    pub url: String,
    /// Accounted bytes released
    pub bytes_freed: u64,
}

impl RemoveResponse {
    pub fn new(url: impl Into<String>, bytes_freed: u64) -> Self {
        Self {
            url: url.into(),
            bytes_freed,
        }
    }
}

/// Response body for GET /pages/top
#[derive(Debug, Clone, Serialize)]
pub struct TopResponse {
    /// Most accessed pages, highest score first
    pub pages: Vec<ScoredPage>,
}

/// Response body for POST /pages/expire
#[derive(Debug, Clone, Serialize)]
pub struct ExpireResponse {
    pub bytes_freed: u64,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of page reads served
    pub hits: u64,
    /// Number of reads of absent pages
    pub misses: u64,
    /// Pages evicted to make room
    pub evictions: u64,
    /// Pages removed by the expiry sweep
    pub expired: u64,
    /// Optimistic transactions retried after a conflict
    pub conflicts: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Accounted bytes currently stored
    pub used_bytes: u64,
    /// Configured byte budget
    pub capacity_bytes: u64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from an engine stats snapshot
    pub fn new(stats: StatsSnapshot, used_bytes: u64, capacity_bytes: u64) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expired: stats.expired,
            conflicts: stats.conflicts,
            used_bytes,
            capacity_bytes,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
