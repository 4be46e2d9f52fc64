//! Page Cache - A network-accessible page cache
//!
//! Stores opaque page content under a url with per-page TTL, access-frequency
//! ranking and a byte budget enforced by least-frequent eviction.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheEngine;
pub use config::Config;
pub use tasks::spawn_sweep_task;
