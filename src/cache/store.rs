//! Cache Store Module
//!
//! Key-tracking cache: a capacity-bounded moka store plus a concurrent index of
//! every live key, so whole key families can be invalidated by prefix.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use moka::notification::RemovalCause;
use moka::sync::Cache;
use tracing::debug;

use crate::cache::policy::starts_with_ignore_case;
use crate::cache::{
    CacheEntry, CacheStats, EntryExpiry, Expiration, ExpirationPolicy, StatsCounters,
};
use crate::config::CacheSettings;
use crate::error::{CacheError, Result};

/// Tracked key -> generation of the entry it was registered for.
type KeyIndex = DashMap<String, u64>;

// == Key Tracking Cache ==
/// Get-or-compute cache with prefix expiration policy and prefix invalidation.
///
/// The store is the source of truth for whether a value is live. The index only
/// enumerates keys; it is kept in step by the store's eviction listener and by
/// [`run_maintenance`](Self::run_maintenance).
///
/// No index guard is ever held while calling into the store, since the store
/// may run the eviction listener (which writes the index) on the calling thread.
///
/// Concurrent misses on the same key are not de-duplicated: every caller that
/// misses runs its own factory, the last write wins in the store, and each
/// caller gets the value it computed.
pub struct KeyTrackingCache {
    /// Underlying capacity-bounded store
    store: Cache<String, CacheEntry>,
    /// Side-index of tracked keys
    index: Arc<KeyIndex>,
    /// Prefix-based expiration policy
    policy: ExpirationPolicy,
    /// Shared read-only settings
    settings: Arc<CacheSettings>,
    /// Performance statistics
    stats: Arc<StatsCounters>,
    /// Source of insertion generations
    next_generation: AtomicU64,
}

impl KeyTrackingCache {
    // == Constructor ==
    /// Creates a cache whose store holds at most `settings.max_entries` entries.
    pub fn new(settings: Arc<CacheSettings>) -> Self {
        let index: Arc<KeyIndex> = Arc::new(DashMap::new());
        let stats = Arc::new(StatsCounters::new());

        let listener_index = Arc::clone(&index);
        let listener_stats = Arc::clone(&stats);
        let store = Cache::builder()
            .max_capacity(settings.max_entries)
            .expire_after(EntryExpiry)
            .eviction_listener(move |key: Arc<String>, entry: CacheEntry, cause| {
                untrack_removed(&listener_index, &listener_stats, &key, &entry, cause);
            })
            .build();

        Self {
            store,
            index,
            policy: ExpirationPolicy::new(Arc::clone(&settings)),
            settings,
            stats,
            next_generation: AtomicU64::new(1),
        }
    }

    // == Get ==
    /// Looks up `key`. A miss, or a value stored as another type, is `Ok(None)`.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        ensure_key(key)?;

        let value = self.store.get(key).and_then(|entry| entry.value_as::<T>());
        match value {
            Some(_) => {
                self.stats.record_hit();
                if self.settings.enable_logging {
                    debug!("Cache hit for key '{}'", key);
                }
            }
            None => {
                self.stats.record_miss();
                if self.settings.enable_logging {
                    debug!("Cache miss for key '{}'", key);
                }
            }
        }

        Ok(value)
    }

    // == Get Or Set ==
    /// Returns the cached value, or runs `factory` once, caches its value under
    /// the policy expiration for `key` and returns it.
    ///
    /// A factory error is returned unchanged and nothing is cached.
    pub fn get_or_set<T, E, F>(&self, key: &str, factory: F) -> std::result::Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: From<CacheError>,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        if let Some(value) = self.get::<T>(key)? {
            return Ok(value);
        }

        let value = factory()?;
        self.insert(key, value.clone(), self.policy.resolve_expiration(key));
        Ok(value)
    }

    /// Suspending form of [`get_or_set`](Self::get_or_set).
    ///
    /// Dropping the returned future cancels the factory; nothing is written.
    pub async fn get_or_set_async<T, E, F, Fut>(
        &self,
        key: &str,
        factory: F,
    ) -> std::result::Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(key)? {
            return Ok(value);
        }

        let value = factory().await?;
        self.insert(key, value.clone(), self.policy.resolve_expiration(key));
        Ok(value)
    }

    // == Set ==
    /// Inserts or replaces `key`.
    ///
    /// Expiration precedence: `sliding`, then `absolute`, then the policy.
    /// An `absolute` instant already in the past stores an entry that is
    /// expired on arrival.
    pub fn set<T>(
        &self,
        key: &str,
        value: T,
        absolute: Option<DateTime<Utc>>,
        sliding: Option<Duration>,
    ) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        ensure_key(key)?;

        let expiration = match (sliding, absolute) {
            (Some(window), _) => Expiration::Sliding(window),
            (None, Some(at)) => Expiration::absolute_at(at),
            (None, None) => self.policy.resolve_expiration(key),
        };
        self.insert(key, value, expiration);
        Ok(())
    }

    pub async fn set_async<T>(
        &self,
        key: &str,
        value: T,
        absolute: Option<DateTime<Utc>>,
        sliding: Option<Duration>,
    ) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        self.set(key, value, absolute, sliding)
    }

    // == Remove ==
    /// Removes `key`; a no-op when it is not cached.
    pub fn remove(&self, key: &str) -> Result<()> {
        ensure_key(key)?;
        self.untrack_and_invalidate(key);
        Ok(())
    }

    pub async fn remove_async(&self, key: &str) -> Result<()> {
        self.remove(key)
    }

    // == Remove By Prefix ==
    /// Removes every tracked key starting with `prefix` (case-insensitive).
    ///
    /// Returns the number of keys removed.
    pub fn remove_by_prefix(&self, prefix: &str) -> Result<usize> {
        if prefix.is_empty() {
            return Err(CacheError::empty_prefix());
        }

        let keys: Vec<String> = self
            .index
            .iter()
            .filter(|tracked| starts_with_ignore_case(tracked.key(), prefix))
            .map(|tracked| tracked.key().clone())
            .collect();

        for key in &keys {
            self.untrack_and_invalidate(key);
        }

        debug!("Removed {} cache entries with prefix '{}'", keys.len(), prefix);
        Ok(keys.len())
    }

    pub async fn remove_by_prefix_async(&self, prefix: &str) -> Result<usize> {
        self.remove_by_prefix(prefix)
    }

    // == Clear ==
    /// Removes every tracked key. Returns the number of keys removed.
    pub fn clear(&self) -> usize {
        let keys = self.snapshot_keys();

        for key in &keys {
            self.untrack_and_invalidate(key);
        }

        debug!("Cleared {} cache entries", keys.len());
        keys.len()
    }

    pub async fn clear_async(&self) -> usize {
        self.clear()
    }

    // == Introspection ==
    /// Currently tracked keys, sorted.
    pub fn tracked_keys(&self) -> Vec<String> {
        let mut keys = self.snapshot_keys();
        keys.sort_unstable();
        keys
    }

    /// Number of tracked keys.
    pub fn count(&self) -> usize {
        self.index.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.index.len())
    }

    // == Maintenance ==
    /// Runs the store's pending housekeeping, which delivers due expirations and
    /// capacity evictions to the eviction listener, then drops index entries
    /// whose key the store no longer holds.
    ///
    /// Returns the number of stale index entries pruned.
    pub fn run_maintenance(&self) -> usize {
        self.store.run_pending_tasks();

        let tracked: Vec<(String, u64)> = self
            .index
            .iter()
            .map(|tracked| (tracked.key().clone(), *tracked.value()))
            .collect();

        let mut pruned = 0;
        for (key, generation) in tracked {
            if self.store.contains_key(key.as_str()) {
                continue;
            }
            if self
                .index
                .remove_if(key.as_str(), |_, current| *current == generation)
                .is_some()
            {
                pruned += 1;
            }
        }
        pruned
    }

    // == Internal Helpers ==
    fn insert<T>(&self, key: &str, value: T, expiration: Expiration)
    where
        T: Send + Sync + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.store
            .insert(key.to_string(), CacheEntry::new(value, expiration, generation));
        self.index.insert(key.to_string(), generation);
    }

    /// Index first: a write racing in between is invalidated below, and the
    /// listener then untracks it by its own generation.
    fn untrack_and_invalidate(&self, key: &str) {
        self.index.remove(key);
        self.store.invalidate(key);
    }

    fn snapshot_keys(&self) -> Vec<String> {
        self.index.iter().map(|tracked| tracked.key().clone()).collect()
    }
}

impl fmt::Debug for KeyTrackingCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyTrackingCache")
            .field("tracked_keys", &self.index.len())
            .field("store_entries", &self.store.entry_count())
            .field("settings", &self.settings)
            .finish()
    }
}

// == Eviction Listener ==
/// Untracks a key the store dropped, unless the index already points at a
/// newer entry for it. Replacements are ignored: the replacing write keeps
/// the key tracked.
fn untrack_removed(
    index: &KeyIndex,
    stats: &StatsCounters,
    key: &str,
    entry: &CacheEntry,
    cause: RemovalCause,
) {
    if cause == RemovalCause::Replaced {
        return;
    }
    if cause.was_evicted() {
        stats.record_eviction();
    }
    index.remove_if(key, |_, generation| *generation == entry.generation);
}

fn ensure_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::empty_key());
    }
    Ok(())
}
