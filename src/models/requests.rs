//! Request DTOs for the admin API
//!
//! Defines the query parameters accepted by the admin endpoints.

use serde::Deserialize;

/// Query string for the key listing (GET /admin/cache/keys)
///
/// # Fields
/// - `prefix`: Optional key prefix to filter by (case-insensitive)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysQuery {
    /// Only list keys starting with this prefix
    #[serde(default)]
    pub prefix: Option<String>,
}

impl KeysQuery {
    /// The prefix filter, treating an empty value as no filter.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|prefix| !prefix.is_empty())
    }
}
