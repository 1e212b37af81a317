//! POS Cache - in-process cache service for the point-of-sale back-end
//!
//! Get-or-compute caching with per-prefix expiration policy and prefix-based
//! invalidation backed by a tracked key index.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{ExpirationPolicy, KeyTrackingCache};
pub use config::{CacheSettings, Config};
pub use error::CacheError;
pub use tasks::spawn_maintenance_task;
