//! Scout service: discovery, cache and selector wired together
//!
//! Replaces lazily-initialized globals with one explicit object. Construct it,
//! call [`ScoutService::start`] to launch cache maintenance and warm-start usage
//! statistics, and [`ScoutService::stop`] to cancel work and persist state.

use crate::cache::{
    schema_key, AdaptiveCache, CacheMaintenance, CacheRefresher, CacheStatistics, CachedPayload, DISCOVERY_KEY,
    SCHEMA_KEY_PREFIX, SELECTION_KEY_PREFIX,
};
use crate::config::Config;
use crate::discovery::{
    CapabilityDescriptor, DiscoveryEngine, DiscoveryResult, N8nHost, NpmRegistry, PackageRegistry, RemoteHost,
};
use crate::error::{Result, ScoutError};
use crate::selector::{SelectableCapability, Selection, ToolContext, ToolSelector};
use crate::store::{open_store, CapabilityStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Recomputes credential schemas in the background. Discovery results are only
/// rebuilt through [`ScoutService::run_discovery`], under the discovery lock.
struct ScoutRefresher {
    host: Arc<dyn RemoteHost>,
}

#[async_trait]
impl CacheRefresher<CachedPayload> for ScoutRefresher {
    async fn refresh(&self, key: &str) -> Result<CachedPayload> {
        if key == DISCOVERY_KEY {
            return Err(ScoutError::cache("Discovery results are not refreshed in the background"));
        }

        if let Some(credential_type) = key.strip_prefix(SCHEMA_KEY_PREFIX) {
            return match self.host.credential_schema(credential_type).await? {
                Some(schema) => Ok(CachedPayload::Schema(schema)),
                None => Err(ScoutError::cache(format!("Credential type '{}' no longer exists", credential_type))),
            };
        }

        Err(ScoutError::cache(format!("No refresher for key '{}'", key)))
    }
}

/// Discovery, adaptive cache and tool selection behind one lifecycle
pub struct ScoutService {
    engine: Arc<DiscoveryEngine>,
    cache: Arc<AdaptiveCache<CachedPayload>>,
    selector: Arc<ToolSelector>,
    store: Option<Arc<dyn CapabilityStore>>,
    maintenance: Mutex<Option<CacheMaintenance>>,
    /// Serializes discovery runs so a cold cache triggers only one
    discovery_lock: Mutex<()>,
    current_run: Mutex<Option<CancellationToken>>,
}

impl ScoutService {
    /// Build a service from explicit collaborators
    pub fn new(
        host: Arc<dyn RemoteHost>,
        registry: Option<Arc<dyn PackageRegistry>>,
        store: Option<Arc<dyn CapabilityStore>>,
        config: &Config,
    ) -> Result<Self> {
        let engine = Arc::new(DiscoveryEngine::new(host, registry, config.discovery.clone())?);
        let cache = Arc::new(AdaptiveCache::new(config.cache.clone())?);
        let selector = Arc::new(ToolSelector::new(config.selector.clone())?);

        Ok(Self {
            engine,
            cache,
            selector,
            store,
            maintenance: Mutex::new(None),
            discovery_lock: Mutex::new(()),
            current_run: Mutex::new(None),
        })
    }

    /// Build a service talking to the configured platform, registry and store
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let host: Arc<dyn RemoteHost> = Arc::new(N8nHost::new(config.remote.clone())?);
        let registry: Option<Arc<dyn PackageRegistry>> = if config.registry.enabled {
            Some(Arc::new(NpmRegistry::new(&config.registry)?))
        } else {
            None
        };
        let store = open_store(&config.store).await?;
        Self::new(host, registry, Some(store), config)
    }

    pub fn engine(&self) -> &Arc<DiscoveryEngine> {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<AdaptiveCache<CachedPayload>> {
        &self.cache
    }

    pub fn selector(&self) -> &Arc<ToolSelector> {
        &self.selector
    }

    /// Start cache maintenance and warm-start usage statistics from the store
    pub async fn start(&self) -> Result<()> {
        let mut maintenance = self.maintenance.lock().await;
        if maintenance.is_some() {
            debug!("Scout service already started");
            return Ok(());
        }

        if let Some(store) = &self.store {
            match store.load_usage_stats().await {
                Ok(stats) if !stats.is_empty() => self.selector.seed_usage(stats).await,
                Ok(_) => {}
                Err(e) => warn!("⚠️  Could not load usage statistics: {}", e),
            }
        }

        let refresher: Arc<dyn CacheRefresher<CachedPayload>> = Arc::new(ScoutRefresher {
            host: Arc::clone(self.engine.host()),
        });
        *maintenance = Some(CacheMaintenance::start(Arc::clone(&self.cache), refresher));
        info!("✅ Scout service started");
        Ok(())
    }

    /// Cancel any running discovery, stop maintenance and persist usage statistics
    pub async fn stop(&self) {
        self.cancel_discovery().await;

        if let Some(maintenance) = self.maintenance.lock().await.take() {
            maintenance.stop().await;
        }

        if let Err(e) = self.persist_usage().await {
            warn!("⚠️  Failed to persist usage statistics: {}", e);
        }
        info!("Scout service stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.maintenance.lock().await.is_some()
    }

    /// Cancel the discovery run in progress, if any
    pub async fn cancel_discovery(&self) -> bool {
        match self.current_run.lock().await.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Run a full discovery pass, store the descriptors and cache the result
    pub async fn run_discovery(&self) -> Result<DiscoveryResult> {
        let _guard = self.discovery_lock.lock().await;
        self.discover_locked().await
    }

    async fn discover_locked(&self) -> Result<DiscoveryResult> {
        let token = CancellationToken::new();
        *self.current_run.lock().await = Some(token.clone());
        let outcome = self.engine.run(token).await;
        *self.current_run.lock().await = None;
        let mut result = outcome?;

        if let Some(store) = &self.store {
            if let Err(e) = store.store_all(&result.descriptors).await {
                warn!("⚠️  Failed to store discovered capabilities: {}", e);
                result.stats.warnings.push(format!("store unavailable: {}", e));
            }
        }

        if result.stats.cancelled {
            info!("Discovery was cancelled; partial result not cached");
            return Ok(result);
        }

        self.cache
            .set(
                DISCOVERY_KEY,
                CachedPayload::Capabilities(result.descriptors.clone()),
                None,
                "discovery",
            )
            .await;
        // Selections were ranked against the previous capability set
        self.cache.invalidate_category("selection").await;

        Ok(result)
    }

    /// Discovered capabilities from the cache, running discovery on a miss
    pub async fn available_capabilities(&self) -> Result<Vec<CapabilityDescriptor>> {
        if let Some(descriptors) = self.cached_capabilities().await {
            return Ok(descriptors);
        }

        let _guard = self.discovery_lock.lock().await;
        // Another caller may have filled the cache while we waited
        if let Some(descriptors) = self
            .cache
            .peek(DISCOVERY_KEY)
            .await
            .and_then(CachedPayload::into_capabilities)
        {
            return Ok(descriptors);
        }

        info!("Capability cache is cold, running discovery");
        Ok(self.discover_locked().await?.descriptors)
    }

    async fn cached_capabilities(&self) -> Option<Vec<CapabilityDescriptor>> {
        self.cache
            .get(DISCOVERY_KEY)
            .await
            .and_then(CachedPayload::into_capabilities)
    }

    /// Select capabilities for a context, reusing a cached selection for the same context
    pub async fn select(&self, context: &ToolContext) -> Result<Selection> {
        let key = selection_key(context)?;
        if let Some(selection) = self.cache.get(&key).await.and_then(CachedPayload::into_selection) {
            debug!("Selection cache hit for {}", key);
            return Ok(selection);
        }

        let descriptors = self.available_capabilities().await?;
        let capabilities: Vec<SelectableCapability> =
            descriptors.iter().map(SelectableCapability::from_descriptor).collect();

        let selection = self.selector.select(&capabilities, context).await;
        self.selector.learn_context_pattern(context, &selection.items).await;
        self.cache
            .set(key, CachedPayload::Selection(selection.clone()), None, "selection")
            .await;

        Ok(selection)
    }

    /// Feed an invocation outcome back into the selector
    pub async fn record_outcome(&self, capability_id: &str, success: bool) {
        self.selector.record_outcome(capability_id, success).await;
        self.cache.invalidate_category("selection").await;
    }

    /// Credential schema from the cache, fetched from the remote host on a miss
    pub async fn credential_schema(&self, credential_type: &str) -> Result<Option<Value>> {
        let key = schema_key(credential_type);
        if let Some(schema) = self.cache.get(&key).await.and_then(CachedPayload::into_schema) {
            return Ok(Some(schema));
        }

        let schema = self.engine.host().credential_schema(credential_type).await?;
        if let Some(ref schema) = schema {
            self.cache
                .set(key, CachedPayload::Schema(schema.clone()), None, "schema")
                .await;
        }
        Ok(schema)
    }

    /// Write the selector's usage statistics to the store. Returns records written.
    pub async fn persist_usage(&self) -> Result<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let stats = self.selector.usage_stats().await;
        store.save_usage_stats(&stats).await?;
        debug!("Persisted {} usage records", stats.len());
        Ok(stats.len())
    }

    pub async fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics().await
    }
}

/// Stable cache key for a selection context
pub fn selection_key(context: &ToolContext) -> Result<String> {
    let canonical = serde_json::to_string(context)?;
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    Ok(format!("{}{:016x}", SELECTION_KEY_PREFIX, hasher.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Intent;

    #[test]
    fn test_selection_key_is_stable_and_distinct() {
        let a = ToolContext::with_query("send slack message");
        let b = ToolContext {
            intent: Some(Intent::Execution),
            ..a.clone()
        };
        assert_eq!(selection_key(&a).unwrap(), selection_key(&a.clone()).unwrap());
        assert_ne!(selection_key(&a).unwrap(), selection_key(&b).unwrap());
        assert!(selection_key(&a).unwrap().starts_with("selection:"));
    }
}
