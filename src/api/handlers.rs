//! API Handlers
//!
//! HTTP request handlers for the admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::cache::policy::starts_with_ignore_case;
use crate::cache::KeyTrackingCache;
use crate::config::Config;
use crate::models::{HealthResponse, KeysQuery, KeysResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// The cache synchronizes internally, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache service
    pub cache: Arc<KeyTrackingCache>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Arc<KeyTrackingCache>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let cache = KeyTrackingCache::new(Arc::new(config.cache.clone()));
        Self::new(Arc::new(cache))
    }
}

/// Handler for GET /admin/cache/keys
///
/// Lists tracked keys, filtered by `?prefix=` when given.
pub async fn keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeysQuery>,
) -> Json<KeysResponse> {
    let mut keys = state.cache.tracked_keys();
    if let Some(prefix) = query.prefix() {
        keys.retain(|key| starts_with_ignore_case(key, prefix));
    }

    Json(KeysResponse::new(keys))
}

/// Handler for GET /admin/cache/stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the service.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
