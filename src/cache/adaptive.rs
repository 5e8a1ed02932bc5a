//! Adaptive cache
//!
//! A keyed cache with per-strategy TTLs, batch LRU eviction, lazy expiry on read,
//! and usage tracking that feeds the background refresh and warming workers.
//! All state sits behind one lock so eviction, sweeps and refresh swaps always
//! see a consistent entry set.

use crate::cache::entry::{CacheEntry, UsagePattern};
use crate::cache::strategy::{RefreshQueue, StrategySet};
use crate::error::{Result, ScoutError};
use crate::utils::duration_secs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Adaptive cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_size: usize,
    /// TTL applied when the caller does not supply one
    #[serde(with = "duration_secs")]
    pub default_ttl: Duration,
    /// Period of the expired-entry sweep
    #[serde(with = "duration_secs")]
    pub cleanup_interval: Duration,
    /// Enable the background refresh worker
    pub enable_background_refresh: bool,
    #[serde(with = "duration_secs")]
    pub refresh_interval: Duration,
    /// Keys refreshed per refresh cycle
    pub refresh_batch_size: usize,
    pub refresh_queue_capacity: usize,
    /// Enable the predictive warming worker
    pub enable_predictive_warming: bool,
    #[serde(with = "duration_secs")]
    pub warming_interval: Duration,
    /// How far ahead warming looks for predicted reads
    #[serde(with = "duration_secs")]
    pub warming_horizon: Duration,
    /// Keys enqueued per warming cycle
    pub max_warming_candidates: usize,
    /// Rarely used patterns idle for this long are pruned; any pattern idle
    /// for four times this long is pruned
    #[serde(with = "duration_secs")]
    pub pattern_stale_after: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(300),
            enable_background_refresh: true,
            refresh_interval: Duration::from_secs(60),
            refresh_batch_size: 5,
            refresh_queue_capacity: 100,
            enable_predictive_warming: true,
            warming_interval: Duration::from_secs(300),
            warming_horizon: Duration::from_secs(600),
            max_warming_candidates: 10,
            pattern_stale_after: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(ScoutError::config("Cache max_size must be greater than zero"));
        }
        if self.default_ttl.is_zero() {
            return Err(ScoutError::config("Cache default_ttl must be greater than zero"));
        }
        for (name, interval) in [
            ("cleanup_interval", self.cleanup_interval),
            ("refresh_interval", self.refresh_interval),
            ("warming_interval", self.warming_interval),
        ] {
            if interval.is_zero() {
                return Err(ScoutError::config(format!("Cache {} must be greater than zero", name)));
            }
        }
        Ok(())
    }
}

/// Snapshot of cache health
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub entries: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, 0 when there were no reads
    pub hit_ratio: f64,
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expired_removed: u64,
    /// Entries past TTL that no read or sweep has removed yet
    pub expired_pending: usize,
    pub per_category: BTreeMap<String, usize>,
    pub average_ttl_ms: u64,
    /// Approximate payload footprint (serialized size plus bookkeeping)
    pub memory_bytes: usize,
    pub refresh_queue_len: usize,
    pub refresh_queue_dropped: u64,
    pub refreshes: u64,
    pub refresh_failures: u64,
    pub tracked_patterns: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
    expired_removed: u64,
    refreshes: u64,
    refresh_failures: u64,
}

#[derive(Debug)]
struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    patterns: HashMap<String, UsagePattern>,
    refresh_queue: RefreshQueue,
    counters: Counters,
}

/// TTL + LRU cache with usage-driven refresh
#[derive(Debug)]
pub struct AdaptiveCache<T> {
    config: CacheConfig,
    strategies: StrategySet,
    state: RwLock<CacheState<T>>,
}

impl<T: Clone + Send + Sync> AdaptiveCache<T> {
    /// Create a cache with the default strategy set
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_strategies(config, StrategySet::default())
    }

    pub fn with_strategies(config: CacheConfig, strategies: StrategySet) -> Result<Self> {
        config.validate()?;
        let refresh_queue = RefreshQueue::new(config.refresh_queue_capacity);
        Ok(Self {
            config,
            strategies,
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                patterns: HashMap::new(),
                refresh_queue,
                counters: Counters::default(),
            }),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Store a value. `ttl` defaults to the configured TTL and is scaled by the
    /// first matching strategy. Never fails; evicts first when full.
    pub async fn set(&self, key: impl Into<String>, data: T, ttl: Option<Duration>, category: impl Into<String>) {
        let key = key.into();
        let category = category.into();
        let (effective_ttl, refresh) = self.resolve_ttl(&key, &category, ttl);

        let mut state = self.state.write().await;
        Self::insert_locked(&mut state, self.config.max_size, key.clone(), data, effective_ttl, category);

        if refresh && self.config.enable_background_refresh {
            state.refresh_queue.push(&key);
        }
        debug!("Cached '{}' for {:?} ({} entries)", key, effective_ttl, state.entries.len());
    }

    /// Read a value. Expired entries are removed and count as misses.
    pub async fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let category = state.entries.get(key).map(|entry| entry.category.clone());
        match state.patterns.get_mut(key) {
            Some(pattern) => pattern.record_access(now),
            None => {
                if state.patterns.len() >= self.config.max_size {
                    Self::trim_patterns_locked(state, self.config.max_size * 9 / 10);
                }
                state
                    .patterns
                    .insert(key.to_string(), UsagePattern::new(key, category, now));
            }
        }

        match state.entries.get(key).map(|entry| entry.is_valid_at(now)) {
            Some(true) => {
                state.counters.hits += 1;
                state.entries.get_mut(key).map(|entry| entry.touch(now).clone())
            }
            Some(false) => {
                state.entries.remove(key);
                state.refresh_queue.remove(key);
                state.counters.expired_removed += 1;
                state.counters.misses += 1;
                debug!("Cache entry '{}' expired on read", key);
                None
            }
            None => {
                state.counters.misses += 1;
                None
            }
        }
    }

    /// Read a valid value without counting a hit or miss and without recording usage
    pub async fn peek(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let state = self.state.read().await;
        state
            .entries
            .get(key)
            .filter(|entry| entry.is_valid_at(now))
            .map(|entry| entry.data.clone())
    }

    /// Whether a valid entry exists. Does not touch statistics.
    pub async fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        let state = self.state.read().await;
        state.entries.get(key).map(|e| e.is_valid_at(now)).unwrap_or(false)
    }

    pub async fn remove(&self, key: &str) -> bool {
        let mut state = self.state.write().await;
        state.refresh_queue.remove(key);
        state.entries.remove(key).is_some()
    }

    /// Remove every entry whose key matches a regular expression
    pub async fn invalidate(&self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;
        let removed = self.remove_where(|key, _| regex.is_match(key)).await;
        debug!("Invalidated {} entries matching '{}'", removed, pattern);
        Ok(removed)
    }

    /// Remove every entry in a category
    pub async fn invalidate_category(&self, category: &str) -> usize {
        let removed = self.remove_where(|_, c| c == category).await;
        debug!("Invalidated {} entries in category '{}'", removed, category);
        removed
    }

    async fn remove_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&str, &str) -> bool,
    {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let doomed: Vec<String> = state
            .entries
            .values()
            .filter(|entry| predicate(&entry.key, &entry.category))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &doomed {
            state.entries.remove(key);
            state.refresh_queue.remove(key);
        }
        doomed.len()
    }

    /// Sweep expired entries and prune stale usage patterns. Returns entries removed.
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let expired: Vec<String> = state
            .entries
            .values()
            .filter(|entry| !entry.is_valid_at(now))
            .map(|entry| entry.key.clone())
            .collect();
        for key in &expired {
            state.entries.remove(key);
            state.refresh_queue.remove(key);
        }
        state.counters.expired_removed += expired.len() as u64;

        let stale_after = self.config.pattern_stale_after;
        let patterns_before = state.patterns.len();
        state.patterns.retain(|_, pattern| !pattern.is_stale(now, stale_after));
        Self::trim_patterns_locked(state, self.config.max_size);
        let pruned = patterns_before - state.patterns.len();

        if !expired.is_empty() || pruned > 0 {
            debug!(
                "🧹 Cache cleanup removed {} expired entries and {} stale patterns",
                expired.len(),
                pruned
            );
        }
        expired.len()
    }

    /// Enqueue a key for background refresh
    pub async fn enqueue_refresh(&self, key: &str) -> bool {
        self.state.write().await.refresh_queue.push(key)
    }

    /// Take up to `max` keys from the refresh queue
    pub async fn drain_refresh_queue(&self, max: usize) -> Vec<String> {
        self.state.write().await.refresh_queue.drain(max)
    }

    /// Swap a refreshed value in place. A key that is no longer cached is
    /// re-inserted under its strategy TTL. Never re-enqueues the key.
    pub async fn apply_refresh(&self, key: &str, data: T) {
        let now = Instant::now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.counters.refreshes += 1;

        if let Some(entry) = state.entries.get_mut(key) {
            entry.replace(data, now);
            debug!("Refreshed cache entry '{}'", key);
            return;
        }

        let category = state
            .patterns
            .get(key)
            .and_then(|pattern| pattern.category.clone())
            .unwrap_or_else(|| "warmed".to_string());
        let (ttl, _) = self.resolve_ttl(key, &category, None);
        Self::insert_locked(state, self.config.max_size, key.to_string(), data, ttl, category);
        debug!("Warmed cache entry '{}'", key);
    }

    pub async fn record_refresh_failure(&self) {
        self.state.write().await.counters.refresh_failures += 1;
    }

    /// Keys predicted to be read within the warming horizon, soonest first.
    /// Only keys whose strategy asks for background refresh are considered.
    pub async fn warming_candidates(&self) -> Vec<String> {
        let now = Instant::now();
        let state = self.state.read().await;
        let mut due: Vec<&UsagePattern> = state
            .patterns
            .values()
            .filter(|pattern| pattern.is_due_within(now, self.config.warming_horizon))
            .filter(|pattern| {
                let category = pattern.category.as_deref().unwrap_or("");
                self.refreshes_in_background(&pattern.key, category)
            })
            .collect();
        due.sort_by_key(|pattern| pattern.predicted_next_access);
        due.into_iter()
            .take(self.config.max_warming_candidates)
            .map(|pattern| pattern.key.clone())
            .collect()
    }

    /// Move warming candidates into the refresh queue. Returns how many were added.
    pub async fn enqueue_warming(&self) -> usize {
        let candidates = self.warming_candidates().await;
        let mut state = self.state.write().await;
        candidates
            .iter()
            .filter(|key| state.refresh_queue.push(key.as_str()))
            .count()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.read().await.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drop all entries, patterns and queued refreshes. Counters are kept.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.patterns.clear();
        state.refresh_queue.clear();
    }

    fn resolve_ttl(&self, key: &str, category: &str, ttl: Option<Duration>) -> (Duration, bool) {
        let base = ttl.unwrap_or(self.config.default_ttl);
        match self.strategies.resolve(key, category) {
            Some(strategy) => (
                Duration::from_secs_f64(base.as_secs_f64() * strategy.ttl_multiplier.max(0.0)),
                strategy.background_refresh,
            ),
            None => (base, false),
        }
    }

    fn refreshes_in_background(&self, key: &str, category: &str) -> bool {
        self.strategies
            .resolve(key, category)
            .map(|strategy| strategy.background_refresh)
            .unwrap_or(false)
    }

    /// Keep at most `limit` usage patterns, dropping the longest idle first
    fn trim_patterns_locked(state: &mut CacheState<T>, limit: usize) {
        if state.patterns.len() <= limit {
            return;
        }
        let mut by_recency: Vec<(Instant, String)> = state
            .patterns
            .values()
            .map(|pattern| (pattern.last_access, pattern.key.clone()))
            .collect();
        by_recency.sort();

        let excess = state.patterns.len() - limit;
        for (_, key) in by_recency.into_iter().take(excess) {
            state.patterns.remove(&key);
        }
    }

    fn insert_locked(
        state: &mut CacheState<T>,
        max_size: usize,
        key: String,
        data: T,
        ttl: Duration,
        category: String,
    ) {
        if !state.entries.contains_key(&key) && state.entries.len() >= max_size {
            Self::evict_locked(state);
        }
        let entry = CacheEntry::new(key.clone(), data, ttl, category);
        state.entries.insert(key, entry);
    }

    /// Remove the least recently used ~10% of entries (at least one)
    fn evict_locked(state: &mut CacheState<T>) {
        let count = (state.entries.len() / 10).max(1);
        let mut by_recency: Vec<(Instant, String)> = state
            .entries
            .values()
            .map(|entry| (entry.last_accessed, entry.key.clone()))
            .collect();
        by_recency.sort();

        for (_, key) in by_recency.into_iter().take(count) {
            state.entries.remove(&key);
            state.refresh_queue.remove(&key);
        }
        state.counters.evictions += count as u64;
        debug!("Evicted {} least recently used cache entries", count);
    }
}

impl<T: Clone + Send + Sync + Serialize> AdaptiveCache<T> {
    /// Hit ratio, evictions, per-category counts, average TTL, pending expiries
    /// and approximate memory use
    pub async fn statistics(&self) -> CacheStatistics {
        let now = Instant::now();
        let state = self.state.read().await;

        let mut per_category = BTreeMap::new();
        let mut total_ttl_ms: u128 = 0;
        let mut expired_pending = 0;
        let mut memory_bytes = 0;

        for entry in state.entries.values() {
            *per_category.entry(entry.category.clone()).or_insert(0) += 1;
            total_ttl_ms += entry.ttl.as_millis();
            if !entry.is_valid_at(now) {
                expired_pending += 1;
            }
            memory_bytes += entry.key.len()
                + entry.category.len()
                + std::mem::size_of::<CacheEntry<T>>()
                + serde_json::to_vec(&entry.data).map(|bytes| bytes.len()).unwrap_or(0);
        }

        let counters = &state.counters;
        let reads = counters.hits + counters.misses;
        let entries = state.entries.len();

        CacheStatistics {
            entries,
            max_size: self.config.max_size,
            hits: counters.hits,
            misses: counters.misses,
            hit_ratio: if reads > 0 { counters.hits as f64 / reads as f64 } else { 0.0 },
            evictions: counters.evictions,
            expired_removed: counters.expired_removed,
            expired_pending,
            per_category,
            average_ttl_ms: if entries > 0 { (total_ttl_ms / entries as u128) as u64 } else { 0 },
            memory_bytes,
            refresh_queue_len: state.refresh_queue.len(),
            refresh_queue_dropped: state.refresh_queue.dropped(),
            refreshes: counters.refreshes,
            refresh_failures: counters.refresh_failures,
            tracked_patterns: state.patterns.len(),
        }
    }
}
