//! Cache Module
//!
//! In-process cache service with prefix-based expiration policy and
//! prefix-based invalidation over a tracked key index.

mod entry;
pub mod policy;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, EntryExpiry, Expiration};
pub use policy::ExpirationPolicy;
pub use stats::{CacheStats, StatsCounters};
pub use store::KeyTrackingCache;
