//! Index Maintenance Task
//!
//! Background task that periodically drives the store's housekeeping and
//! reconciles the tracked key index against it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::KeyTrackingCache;

/// Spawns a background task that runs [`KeyTrackingCache::run_maintenance`]
/// every `interval_secs` seconds.
///
/// Maintenance is synchronous work, so each run happens on the blocking pool.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(KeyTrackingCache::new(Arc::new(CacheSettings::default())));
/// let handle = spawn_maintenance_task(cache.clone(), 30);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_maintenance_task(cache: Arc<KeyTrackingCache>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting index maintenance task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let cache = Arc::clone(&cache);
            let pruned = match tokio::task::spawn_blocking(move || cache.run_maintenance()).await
            {
                Ok(pruned) => pruned,
                Err(err) => {
                    debug!("Index maintenance run did not complete: {}", err);
                    continue;
                }
            };

            if pruned > 0 {
                info!("Index maintenance: pruned {} stale keys", pruned);
            } else {
                debug!("Index maintenance: no stale keys found");
            }
        }
    })
}
