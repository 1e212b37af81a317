//! Cache Entry Module
//!
//! Defines the stored entry and the per-entry expiry rules handed to the
//! underlying store.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use moka::Expiry;

// == Expiration ==
/// Expiration mode attached to an entry at insertion time.
///
/// Sliding and absolute expiration are mutually exclusive per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Expires this long after insertion, regardless of reads
    Absolute(Duration),
    /// Expires after this long without a read
    Sliding(Duration),
}

impl Expiration {
    /// Absolute expiration at a wall-clock instant.
    ///
    /// An instant in the past yields an entry that is expired on arrival.
    pub fn absolute_at(at: DateTime<Utc>) -> Self {
        let remaining = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        Expiration::Absolute(remaining)
    }

    /// The window this mode applies.
    pub fn duration(&self) -> Duration {
        match self {
            Expiration::Absolute(ttl) | Expiration::Sliding(ttl) => *ttl,
        }
    }

    pub fn is_sliding(&self) -> bool {
        matches!(self, Expiration::Sliding(_))
    }
}

// == Cache Entry ==
/// A single stored value with its expiration metadata.
///
/// The value is type-erased; readers downcast to the type they ask for.
#[derive(Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Arc<dyn Any + Send + Sync>,
    /// Expiration mode chosen at insertion
    pub expiration: Expiration,
    /// Insertion generation, unique per write
    pub generation: u64,
    /// Insertion timestamp
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new<T>(value: T, expiration: Expiration, generation: u64) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            value: Arc::new(value),
            expiration,
            generation,
            created_at: Utc::now(),
        }
    }

    // == Downcast ==
    /// Returns a clone of the value if it was stored as a `T`.
    pub fn value_as<T>(&self) -> Option<T>
    where
        T: Clone + 'static,
    {
        self.value.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("expiration", &self.expiration)
            .field("generation", &self.generation)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

// == Entry Expiry ==
/// Per-entry expiry rules for the underlying store.
///
/// Absolute entries keep their deadline across reads; sliding entries get a
/// fresh window on every read. A replacing write starts over with the new
/// entry's own mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.expiration.duration())
    }

    fn expire_after_read(
        &self,
        _key: &String,
        value: &CacheEntry,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        match value.expiration {
            Expiration::Sliding(window) => Some(window),
            Expiration::Absolute(_) => duration_until_expiry,
        }
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expiration.duration())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_downcast_matching_type() {
        let entry = CacheEntry::new(42u32, Expiration::Sliding(Duration::from_secs(60)), 1);

        assert_eq!(entry.value_as::<u32>(), Some(42));
        assert_eq!(entry.generation, 1);
    }

    #[test]
    fn test_entry_downcast_other_type() {
        let entry = CacheEntry::new(
            "value".to_string(),
            Expiration::Absolute(Duration::from_secs(60)),
            1,
        );

        assert_eq!(entry.value_as::<u32>(), None);
        assert_eq!(entry.value_as::<String>(), Some("value".to_string()));
    }

    #[test]
    fn test_absolute_at_future() {
        let at = Utc::now() + chrono::Duration::seconds(30);
        match Expiration::absolute_at(at) {
            Expiration::Absolute(ttl) => {
                assert!(ttl <= Duration::from_secs(30));
                assert!(ttl >= Duration::from_secs(29));
            }
            other => panic!("expected absolute expiration, got {:?}", other),
        }
    }

    #[test]
    fn test_absolute_at_past_is_zero() {
        let at = Utc::now() - chrono::Duration::seconds(30);
        assert_eq!(
            Expiration::absolute_at(at),
            Expiration::Absolute(Duration::ZERO)
        );
    }

    #[test]
    fn test_expiry_sliding_renews_on_read() {
        let entry = CacheEntry::new((), Expiration::Sliding(Duration::from_secs(60)), 1);
        let now = Instant::now();

        let renewed = EntryExpiry.expire_after_read(
            &"k".to_string(),
            &entry,
            now,
            Some(Duration::from_secs(5)),
            now,
        );
        assert_eq!(renewed, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_expiry_absolute_keeps_deadline_on_read() {
        let entry = CacheEntry::new((), Expiration::Absolute(Duration::from_secs(60)), 1);
        let now = Instant::now();

        let remaining = EntryExpiry.expire_after_read(
            &"k".to_string(),
            &entry,
            now,
            Some(Duration::from_secs(5)),
            now,
        );
        assert_eq!(remaining, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_expiry_update_uses_new_mode() {
        let entry = CacheEntry::new((), Expiration::Absolute(Duration::from_secs(90)), 2);

        let ttl = EntryExpiry.expire_after_update(
            &"k".to_string(),
            &entry,
            Instant::now(),
            Some(Duration::from_secs(5)),
        );
        assert_eq!(ttl, Some(Duration::from_secs(90)));
    }
}
