//! Adaptive cache
//!
//! TTL + LRU caching of discovery results, credential schemas and selections,
//! with strategy-driven TTLs, background refresh and predictive warming.

pub mod adaptive;
pub mod entry;
pub mod maintenance;
pub mod payload;
pub mod strategy;

pub use adaptive::{AdaptiveCache, CacheConfig, CacheStatistics};
pub use entry::{CacheEntry, UsagePattern};
pub use maintenance::{run_refresh_cycle, run_warming_cycle, CacheMaintenance, CacheRefresher};
pub use payload::{schema_key, CachedPayload, DISCOVERY_KEY, SCHEMA_KEY_PREFIX, SELECTION_KEY_PREFIX};
pub use strategy::{CacheStrategy, KeyMatcher, RefreshQueue, StrategySet};
