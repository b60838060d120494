//! Prune Task
//!
//! Background task that periodically removes entries older than the cache's
//! maximum age, independent of any request or cache handle lifetime.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::ExpiringKeyCache;

/// Spawns a background task that prunes expired entries every
/// `prune_interval_secs` seconds.
///
/// Failures are logged and the loop carries on. The returned handle is
/// aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(ExpiringKeyCache::new(backend, CacheSettings::with_max_age(300)));
/// let prune_handle = spawn_prune_task(cache.clone(), 60);
/// // Later, during shutdown:
/// prune_handle.abort();
/// ```
pub fn spawn_prune_task(cache: Arc<ExpiringKeyCache>, prune_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(prune_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting prune task with interval of {} seconds (max_age={}s)",
            interval.as_secs(),
            cache.max_age()
        );

        loop {
            tokio::time::sleep(interval).await;

            let worker = Arc::clone(&cache);
            let result = tokio::task::spawn_blocking(move || worker.try_prune()).await;

            match result {
                Ok(Ok(0)) => debug!("Prune: no expired entries found"),
                Ok(Ok(removed)) => info!("Prune: removed {} expired entries", removed),
                Ok(Err(e)) => warn!("Prune failed: {}", e),
                Err(e) => warn!("Prune worker did not complete: {}", e),
            }
        }
    })
}
