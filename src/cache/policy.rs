//! Expiration Policy Module
//!
//! Maps cache keys to expiration durations through the configured prefix table.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::Expiration;
use crate::config::CacheSettings;

// == Expiration Policy ==
/// Resolves the time-to-live of a key from its leading prefix.
#[derive(Debug, Clone)]
pub struct ExpirationPolicy {
    settings: Arc<CacheSettings>,
}

impl ExpirationPolicy {
    pub fn new(settings: Arc<CacheSettings>) -> Self {
        Self { settings }
    }

    // == Resolve TTL ==
    /// Returns the TTL of the first configured prefix `key` starts with
    /// (case-insensitive), or the default TTL when none matches.
    pub fn resolve_ttl_seconds(&self, key: &str) -> u64 {
        self.settings
            .prefix_ttls
            .iter()
            .find(|(prefix, _)| starts_with_ignore_case(key, prefix))
            .map(|(_, ttl)| *ttl)
            .unwrap_or(self.settings.default_ttl)
    }

    /// Current UTC time plus the key's TTL.
    pub fn resolve_absolute_expiration(&self, key: &str) -> DateTime<Utc> {
        let now = Utc::now();
        i64::try_from(self.resolve_ttl_seconds(key))
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// The fixed default window when sliding mode is on, otherwise half the
    /// key's TTL (whole seconds).
    pub fn resolve_sliding_expiration(&self, key: &str) -> Duration {
        if self.settings.use_sliding_expiration {
            Duration::from_secs(self.settings.default_sliding_ttl)
        } else {
            Duration::from_secs(self.resolve_ttl_seconds(key) / 2)
        }
    }

    // == Resolve Expiration ==
    /// Picks the expiration mode for an entry the caller gave no explicit
    /// expiration for.
    pub fn resolve_expiration(&self, key: &str) -> Expiration {
        if self.settings.use_sliding_expiration {
            Expiration::Sliding(self.resolve_sliding_expiration(key))
        } else {
            Expiration::absolute_at(self.resolve_absolute_expiration(key))
        }
    }
}

// == Utility Functions ==
/// Case-insensitive ordinal prefix test.
pub fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    let mut chars = value.chars();
    prefix.chars().all(|p| {
        chars
            .next()
            .is_some_and(|c| c.to_lowercase().eq(p.to_lowercase()))
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn policy_with(settings: CacheSettings) -> ExpirationPolicy {
        ExpirationPolicy::new(Arc::new(settings))
    }

    #[test]
    fn test_resolve_ttl_default_table() {
        let policy = policy_with(CacheSettings::default());

        assert_eq!(policy.resolve_ttl_seconds("User:42"), 600);
        assert_eq!(policy.resolve_ttl_seconds("User:42:Roles"), 600);
        assert_eq!(policy.resolve_ttl_seconds("Package:Type:starter"), 1800);
        assert_eq!(policy.resolve_ttl_seconds("GeoLocation:10.0.0.1"), 86400);
        assert_eq!(policy.resolve_ttl_seconds("Inventory:7"), 120);
        assert_eq!(policy.resolve_ttl_seconds("Unknown:1"), 300);
    }

    #[test]
    fn test_resolve_ttl_is_case_insensitive() {
        let policy = policy_with(CacheSettings::default());

        assert_eq!(policy.resolve_ttl_seconds("user:42"), 600);
        assert_eq!(policy.resolve_ttl_seconds("CURRENCY:EUR"), 3600);
    }

    #[test]
    fn test_resolve_ttl_requires_full_prefix() {
        let policy = policy_with(CacheSettings::default());

        // "User" without the colon is not the "User:" prefix
        assert_eq!(policy.resolve_ttl_seconds("User"), 300);
        assert_eq!(policy.resolve_ttl_seconds("Users:1"), 300);
    }

    #[test]
    fn test_resolve_ttl_first_match_wins() {
        let policy = policy_with(CacheSettings {
            prefix_ttls: vec![("User:".to_string(), 10), ("User:42".to_string(), 20)],
            ..CacheSettings::default()
        });
        assert_eq!(policy.resolve_ttl_seconds("User:42"), 10);

        let policy = policy_with(CacheSettings {
            prefix_ttls: vec![("User:42".to_string(), 20), ("User:".to_string(), 10)],
            ..CacheSettings::default()
        });
        assert_eq!(policy.resolve_ttl_seconds("User:42"), 20);
    }

    #[test]
    fn test_resolve_absolute_expiration() {
        let policy = policy_with(CacheSettings::default());

        let before = Utc::now();
        let expires = policy.resolve_absolute_expiration("User:1");
        let after = Utc::now();

        assert!(expires >= before + chrono::Duration::seconds(600));
        assert!(expires <= after + chrono::Duration::seconds(600));
    }

    #[test]
    fn test_resolve_sliding_uses_default_window_when_enabled() {
        let policy = policy_with(CacheSettings::default());
        assert_eq!(
            policy.resolve_sliding_expiration("Package:1"),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_resolve_sliding_halves_ttl_when_disabled() {
        let policy = policy_with(CacheSettings {
            use_sliding_expiration: false,
            ..CacheSettings::default()
        });
        assert_eq!(
            policy.resolve_sliding_expiration("Package:1"),
            Duration::from_secs(900)
        );
        // 1 second TTL truncates to a zero window
        let policy = policy_with(CacheSettings {
            use_sliding_expiration: false,
            prefix_ttls: vec![("Tiny:".to_string(), 1)],
            ..CacheSettings::default()
        });
        assert_eq!(policy.resolve_sliding_expiration("Tiny:1"), Duration::ZERO);
    }

    #[test]
    fn test_resolve_expiration_follows_switch() {
        let sliding = policy_with(CacheSettings::default());
        assert_eq!(
            sliding.resolve_expiration("User:1"),
            Expiration::Sliding(Duration::from_secs(60))
        );

        let absolute = policy_with(CacheSettings {
            use_sliding_expiration: false,
            ..CacheSettings::default()
        });
        match absolute.resolve_expiration("User:1") {
            Expiration::Absolute(ttl) => {
                assert!(ttl <= Duration::from_secs(600));
                assert!(ttl >= Duration::from_secs(598));
            }
            other => panic!("expected absolute expiration, got {:?}", other),
        }
    }

    #[test]
    fn test_starts_with_ignore_case() {
        assert!(starts_with_ignore_case("Product:1", "product:"));
        assert!(starts_with_ignore_case("Product:1", ""));
        assert!(!starts_with_ignore_case("Prod", "Product:"));
        assert!(!starts_with_ignore_case("Category:1", "Product:"));
        assert!(starts_with_ignore_case("ÉTÉ:1", "été:"));
    }
}
