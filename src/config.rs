//! Configuration Module
//!
//! Handles loading the service and cache configuration from environment variables.

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Prefix-to-TTL table used when `CACHE_PREFIX_TTLS` is not set.
pub const DEFAULT_PREFIX_TTLS: &[(&str, u64)] = &[
    ("User:", 600),
    ("Package:", 1800),
    ("GeoLocation:", 86400),
    ("Product:", 300),
    ("Category:", 600),
    ("Inventory:", 120),
    ("Currency:", 3600),
];

/// Cache policy settings.
///
/// Built once at startup and shared read-only (`Arc<CacheSettings>`) with the
/// expiration policy and the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Ordered prefix-to-TTL table (seconds); the first matching prefix wins
    pub prefix_ttls: Vec<(String, u64)>,
    /// TTL in seconds for keys no prefix matches
    pub default_ttl: u64,
    /// Fixed sliding window in seconds
    pub default_sliding_ttl: u64,
    /// Selects sliding over absolute expiration for policy-computed entries
    pub use_sliding_expiration: bool,
    /// Emits per-lookup hit/miss debug lines
    pub enable_logging: bool,
    /// Capacity of the underlying store
    pub max_entries: u64,
}

impl CacheSettings {
    /// Loads cache settings from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PREFIX_TTLS` - `Prefix=seconds` pairs separated by commas,
    ///   e.g. `User:=600,Product:=300` (default: built-in table)
    /// - `CACHE_DEFAULT_TTL` - TTL for unmatched keys (default: 300)
    /// - `CACHE_DEFAULT_SLIDING_TTL` - sliding window (default: 60)
    /// - `CACHE_USE_SLIDING_EXPIRATION` - sliding vs absolute (default: true)
    /// - `CACHE_ENABLE_LOGGING` - hit/miss logging (default: false)
    /// - `MAX_ENTRIES` - store capacity (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            prefix_ttls: env::var("CACHE_PREFIX_TTLS")
                .ok()
                .map(|raw| parse_prefix_ttls(&raw))
                .unwrap_or(defaults.prefix_ttls),
            default_ttl: env_or("CACHE_DEFAULT_TTL", defaults.default_ttl),
            default_sliding_ttl: env_or("CACHE_DEFAULT_SLIDING_TTL", defaults.default_sliding_ttl),
            use_sliding_expiration: env_or(
                "CACHE_USE_SLIDING_EXPIRATION",
                defaults.use_sliding_expiration,
            ),
            enable_logging: env_or("CACHE_ENABLE_LOGGING", defaults.enable_logging),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            prefix_ttls: DEFAULT_PREFIX_TTLS
                .iter()
                .map(|(prefix, ttl)| (prefix.to_string(), *ttl))
                .collect(),
            default_ttl: 300,
            default_sliding_ttl: 60,
            use_sliding_expiration: true,
            enable_logging: false,
            max_entries: 10_000,
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache policy settings
    pub cache: CacheSettings,
    /// HTTP port of the admin surface
    pub server_port: u16,
    /// Interval in seconds between index maintenance runs
    pub maintenance_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAINTENANCE_INTERVAL` - maintenance frequency in seconds (default: 30)
    /// - everything read by [`CacheSettings::from_env`]
    pub fn from_env() -> Self {
        Self {
            cache: CacheSettings::from_env(),
            server_port: env_or("SERVER_PORT", 3000),
            maintenance_interval: env_or("MAINTENANCE_INTERVAL", 30),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            server_port: 3000,
            maintenance_interval: 30,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses `Prefix=seconds` pairs, keeping their order.
///
/// The split happens at the last `=` so prefixes may contain `=` themselves.
fn parse_prefix_ttls(raw: &str) -> Vec<(String, u64)> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let parsed = pair.rsplit_once('=').and_then(|(prefix, ttl)| {
                let prefix = prefix.trim();
                let ttl = ttl.trim().parse::<u64>().ok()?;
                (!prefix.is_empty()).then(|| (prefix.to_string(), ttl))
            });
            if parsed.is_none() {
                warn!("Ignoring malformed CACHE_PREFIX_TTLS entry '{}'", pair);
            }
            parsed
        })
        .collect()
}
