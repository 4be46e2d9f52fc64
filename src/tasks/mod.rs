//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: removes pages whose TTL has passed at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
