//! API Module
//!
//! Read-only administrative HTTP surface over the cache.
//!
//! # Endpoints
//! - `GET /admin/cache/keys` - List tracked keys, optionally by prefix
//! - `GET /admin/cache/stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
