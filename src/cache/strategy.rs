//! Cache strategies and the background refresh queue
//!
//! Strategies are evaluated in priority order when a key is written. The first
//! match scales the caller's TTL and decides whether the key is kept fresh by the
//! background refresh worker.

use regex::Regex;
use std::collections::VecDeque;
use tracing::debug;

/// Predicate over a cache key and its category
#[derive(Debug, Clone)]
pub enum KeyMatcher {
    Any,
    Prefix(String),
    Contains(String),
    Category(String),
    Pattern(Regex),
}

impl KeyMatcher {
    pub fn matches(&self, key: &str, category: &str) -> bool {
        match self {
            KeyMatcher::Any => true,
            KeyMatcher::Prefix(prefix) => key.starts_with(prefix.as_str()),
            KeyMatcher::Contains(fragment) => key.contains(fragment.as_str()),
            KeyMatcher::Category(c) => c == category,
            KeyMatcher::Pattern(regex) => regex.is_match(key),
        }
    }
}

/// One (predicate, ttl multiplier, background refresh) rule
#[derive(Debug, Clone)]
pub struct CacheStrategy {
    pub name: String,
    pub matcher: KeyMatcher,
    pub ttl_multiplier: f64,
    pub background_refresh: bool,
    /// Higher runs first
    pub priority: u32,
}

impl CacheStrategy {
    pub fn new(name: impl Into<String>, matcher: KeyMatcher, ttl_multiplier: f64, background_refresh: bool, priority: u32) -> Self {
        Self {
            name: name.into(),
            matcher,
            ttl_multiplier,
            background_refresh,
            priority,
        }
    }
}

/// Ordered strategy list
#[derive(Debug, Clone)]
pub struct StrategySet {
    strategies: Vec<CacheStrategy>,
}

impl StrategySet {
    pub fn new(mut strategies: Vec<CacheStrategy>) -> Self {
        // Stable sort keeps insertion order among equal priorities
        strategies.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { strategies }
    }

    /// First strategy matching the key, if any
    pub fn resolve(&self, key: &str, category: &str) -> Option<&CacheStrategy> {
        self.strategies.iter().find(|s| s.matcher.matches(key, category))
    }

    pub fn strategies(&self) -> &[CacheStrategy] {
        &self.strategies
    }
}

impl Default for StrategySet {
    /// Discovery results live longer, generated schemas longest and are kept warm,
    /// selections are short-lived.
    fn default() -> Self {
        Self::new(vec![
            CacheStrategy::new("schema", KeyMatcher::Prefix("schema:".to_string()), 4.0, true, 100),
            CacheStrategy::new("discovery", KeyMatcher::Prefix("discovery:".to_string()), 2.0, false, 90),
            CacheStrategy::new("selection", KeyMatcher::Prefix("selection:".to_string()), 0.25, false, 80),
            CacheStrategy::new("default", KeyMatcher::Any, 1.0, false, 0),
        ])
    }
}

/// Bounded FIFO of keys awaiting background refresh
#[derive(Debug, Clone)]
pub struct RefreshQueue {
    keys: VecDeque<String>,
    capacity: usize,
    dropped: u64,
}

impl RefreshQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            dropped: 0,
        }
    }

    /// Enqueue a key unless already queued. When full, the oldest key is dropped.
    /// Returns whether the key was added.
    pub fn push(&mut self, key: &str) -> bool {
        if self.capacity == 0 || self.keys.iter().any(|k| k == key) {
            return false;
        }
        if self.keys.len() >= self.capacity {
            if let Some(dropped) = self.keys.pop_front() {
                debug!("Refresh queue full, dropping '{}'", dropped);
                self.dropped += 1;
            }
        }
        self.keys.push_back(key.to_string());
        true
    }

    /// Take up to `max` keys from the front
    pub fn drain(&mut self, max: usize) -> Vec<String> {
        let count = max.min(self.keys.len());
        self.keys.drain(..count).collect()
    }

    pub fn remove(&mut self, key: &str) {
        self.keys.retain(|k| k != key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys dropped because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
