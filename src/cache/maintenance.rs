//! Background cache maintenance
//!
//! Three periodic workers keep an [`AdaptiveCache`] healthy: a TTL sweep, a
//! refresh worker that drains the refresh queue through a [`CacheRefresher`], and
//! predictive warming that feeds the refresh queue from usage patterns. The
//! refresher is called without holding the cache lock; each result is applied
//! with a single swap.

use crate::cache::adaptive::AdaptiveCache;
use crate::error::Result;
use crate::utils::PeriodicTask;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Recomputes the value behind a cache key
#[async_trait]
pub trait CacheRefresher<T>: Send + Sync {
    async fn refresh(&self, key: &str) -> Result<T>;
}

/// Handle to the running maintenance workers
#[derive(Debug)]
pub struct CacheMaintenance {
    token: CancellationToken,
    tasks: Vec<PeriodicTask>,
}

impl CacheMaintenance {
    /// Spawn the sweep, refresh and warming workers for `cache`
    pub fn start<T>(cache: Arc<AdaptiveCache<T>>, refresher: Arc<dyn CacheRefresher<T>>) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let token = CancellationToken::new();
        let config = cache.config().clone();
        let mut tasks = Vec::new();

        let sweep_cache = Arc::clone(&cache);
        tasks.push(PeriodicTask::spawn(
            "cache-cleanup",
            config.cleanup_interval,
            token.child_token(),
            move || {
                let cache = Arc::clone(&sweep_cache);
                async move {
                    cache.cleanup().await;
                }
            },
        ));

        if config.enable_background_refresh {
            let refresh_cache = Arc::clone(&cache);
            let refresher = Arc::clone(&refresher);
            tasks.push(PeriodicTask::spawn(
                "cache-refresh",
                config.refresh_interval,
                token.child_token(),
                move || {
                    let cache = Arc::clone(&refresh_cache);
                    let refresher = Arc::clone(&refresher);
                    async move {
                        run_refresh_cycle(&cache, refresher.as_ref()).await;
                    }
                },
            ));
        }

        if config.enable_predictive_warming {
            let warming_cache = Arc::clone(&cache);
            tasks.push(PeriodicTask::spawn(
                "cache-warming",
                config.warming_interval,
                token.child_token(),
                move || {
                    let cache = Arc::clone(&warming_cache);
                    async move {
                        run_warming_cycle(&cache).await;
                    }
                },
            ));
        }

        info!("🔄 Started {} cache maintenance workers", tasks.len());
        Self { token, tasks }
    }

    /// Names of the running workers
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.name()).collect()
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Cancel all workers and wait for them to exit
    pub async fn stop(self) {
        self.token.cancel();
        for task in self.tasks {
            task.join().await;
        }
        info!("Cache maintenance workers stopped");
    }
}

/// Refresh one batch of queued keys. Failed keys are dropped from the queue
/// and keep their current value. Returns the number refreshed.
pub async fn run_refresh_cycle<T>(cache: &AdaptiveCache<T>, refresher: &dyn CacheRefresher<T>) -> usize
where
    T: Clone + Send + Sync,
{
    let keys = cache.drain_refresh_queue(cache.config().refresh_batch_size).await;
    if keys.is_empty() {
        return 0;
    }

    let mut refreshed = 0;
    for key in keys {
        match refresher.refresh(&key).await {
            Ok(data) => {
                cache.apply_refresh(&key, data).await;
                refreshed += 1;
            }
            Err(e) if e.is_transient() => {
                cache.record_refresh_failure().await;
                debug!("Background refresh of '{}' failed, keeping current value: {}", key, e);
            }
            Err(e) => {
                cache.record_refresh_failure().await;
                warn!("⚠️  Background refresh of '{}' failed ({}): {}", key, e.category(), e);
            }
        }
    }
    debug!("Refresh cycle updated {} entries", refreshed);
    refreshed
}

/// Queue keys predicted to be read soon. Returns the number enqueued.
pub async fn run_warming_cycle<T>(cache: &AdaptiveCache<T>) -> usize
where
    T: Clone + Send + Sync,
{
    let queued = cache.enqueue_warming().await;
    if queued > 0 {
        debug!("Predictive warming queued {} keys", queued);
    }
    queued
}
