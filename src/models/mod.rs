//! Request and Response models for the page cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! deserializing query strings and serializing HTTP response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{PageQuery, TopQuery, UpsertQuery};
pub use responses::{
    ExpireResponse, HealthResponse, RemoveResponse, StatsResponse, TopResponse, UpsertResponse,
};
