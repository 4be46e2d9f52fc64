//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::RetryPolicy;

/// Which backing store the engine runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process indices, lost on restart
    Memory,
    /// External Redis server at `redis_host:redis_port`
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backing store selection
    pub backend: StoreBackend,
    /// Redis host
    pub redis_host: String,
    /// Redis port
    pub redis_port: u16,
    /// Namespace prepended to every Redis key
    pub redis_key_prefix: String,
    /// Total byte budget for cached pages
    pub capacity_bytes: u64,
    /// Seconds added to now for pages upserted without a ttl
    pub default_ttl: u64,
    /// Default number of entries returned by the top query
    pub top_records: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Expiry sweep interval in seconds
    pub sweep_interval: u64,
    /// Maximum attempts per conflicting transaction, 0 = unbounded
    pub conflict_retry_limit: u32,
    /// Base backoff between conflicting attempts in milliseconds
    pub conflict_backoff_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STORE_BACKEND` - `memory` or `redis` (default: memory)
    /// - `REDIS_HOST` - Redis host (default: 127.0.0.1)
    /// - `REDIS_PORT` - Redis port (default: 6379)
    /// - `REDIS_KEY_PREFIX` - Redis key namespace (default: pagecache)
    /// - `CACHE_CAPACITY` - Capacity in bytes (default: 64 MiB)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `TOP_RECORDS` - Default top query size (default: 10)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    /// - `CONFLICT_RETRY_LIMIT` - Attempts per transaction, 0 = unbounded (default: 0)
    /// - `CONFLICT_BACKOFF_MS` - Base retry backoff in ms (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: parse_var("STORE_BACKEND").unwrap_or(defaults.backend),
            redis_host: env::var("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_port: parse_var("REDIS_PORT").unwrap_or(defaults.redis_port),
            redis_key_prefix: env::var("REDIS_KEY_PREFIX").unwrap_or(defaults.redis_key_prefix),
            capacity_bytes: parse_var("CACHE_CAPACITY").unwrap_or(defaults.capacity_bytes),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            top_records: parse_var("TOP_RECORDS").unwrap_or(defaults.top_records),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            conflict_retry_limit: parse_var("CONFLICT_RETRY_LIMIT")
                .unwrap_or(defaults.conflict_retry_limit),
            conflict_backoff_ms: parse_var("CONFLICT_BACKOFF_MS")
                .unwrap_or(defaults.conflict_backoff_ms),
        }
    }

    /// Builds the optimistic retry policy described by this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.conflict_backoff_ms);
        if self.conflict_retry_limit == 0 {
            RetryPolicy::unbounded().with_backoff(base, base * 64)
        } else {
            RetryPolicy::bounded(self.conflict_retry_limit).with_backoff(base, base * 64)
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_key_prefix: "pagecache".to_string(),
            capacity_bytes: 64 * 1024 * 1024,
            default_ttl: 300,
            top_records: 10,
            server_port: 3000,
            sweep_interval: 1,
            conflict_retry_limit: 0,
            conflict_backoff_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.redis_port, 6379);
        assert_eq!(config.capacity_bytes, 64 * 1024 * 1024);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.top_records, 10);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.sweep_interval, 1);
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("redis".parse::<StoreBackend>(), Ok(StoreBackend::Redis));
        assert_eq!("Memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_default_retry_policy_is_unbounded() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.max_attempts, None);
        assert_eq!(policy.backoff(5), Duration::ZERO);
    }

    #[test]
    fn test_bounded_retry_policy() {
        let config = Config {
            conflict_retry_limit: 4,
            conflict_backoff_ms: 2,
            ..Config::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, Some(4));
        assert_eq!(policy.backoff(1), Duration::from_millis(2));
    }
}
