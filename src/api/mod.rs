//! API Module
//!
//! HTTP handlers and routing for the page cache REST API.
//!
//! # Endpoints
//! - `GET /pages?url=` - Retrieve page content
//! - `PUT /pages?url=&ttl=` - Store a page
//! - `DELETE /pages?url=` - Remove a page
//! - `GET /pages/top` - Most accessed pages
//! - `POST /pages/expire` - Run the expiry sweep
//! - `GET /stats` - Engine statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
