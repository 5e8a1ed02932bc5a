//! Cache entries and usage patterns

use std::time::Duration;
use tokio::time::Instant;

/// A cached value with TTL and access bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// Stable key
    pub key: String,
    /// Cached value
    pub data: T,
    /// When this entry was created (or last refreshed)
    pub created_at: Instant,
    /// Time-to-live, already scaled by the matching strategy
    pub ttl: Duration,
    /// Category used for bulk invalidation
    pub category: String,
    /// Number of hits
    pub access_count: u64,
    /// Last hit, or creation time if never read
    pub last_accessed: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(key: impl Into<String>, data: T, ttl: Duration, category: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            key: key.into(),
            data,
            created_at: now,
            ttl,
            category: category.into(),
            access_count: 0,
            last_accessed: now,
        }
    }

    /// Valid while strictly younger than its TTL
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < self.ttl
    }

    /// Record a hit and return the data
    pub fn touch(&mut self, now: Instant) -> &T {
        self.access_count += 1;
        self.last_accessed = now;
        &self.data
    }

    /// Swap in a refreshed value, restarting the TTL but keeping access history
    pub fn replace(&mut self, data: T, now: Instant) {
        self.data = data;
        self.created_at = now;
    }
}

/// Per-key access tracker used for predictive warming
#[derive(Debug, Clone)]
pub struct UsagePattern {
    pub key: String,
    /// Number of reads observed
    pub frequency: u64,
    pub first_access: Instant,
    pub last_access: Instant,
    /// Linear extrapolation of the next read
    pub predicted_next_access: Option<Instant>,
    pub category: Option<String>,
}

impl UsagePattern {
    pub fn new(key: impl Into<String>, category: Option<String>, now: Instant) -> Self {
        Self {
            key: key.into(),
            frequency: 1,
            first_access: now,
            last_access: now,
            predicted_next_access: None,
            category,
        }
    }

    /// Record a read and update the prediction
    pub fn record_access(&mut self, now: Instant) {
        self.frequency += 1;
        self.last_access = now;
        self.predicted_next_access = self.average_interval().map(|interval| now + interval);
    }

    /// Mean time between reads, once there are at least two
    pub fn average_interval(&self) -> Option<Duration> {
        if self.frequency < 2 {
            return None;
        }
        let span = self.last_access.saturating_duration_since(self.first_access);
        Some(span / (self.frequency - 1) as u32)
    }

    /// Rarely used and not seen for longer than `window`, or not seen for
    /// longer than four windows however often it was read before
    pub fn is_stale(&self, now: Instant, window: Duration) -> bool {
        let idle = now.saturating_duration_since(self.last_access);
        (self.frequency < 2 && idle > window) || idle > window * 4
    }

    /// Predicted to be read between `now` and `now + horizon`
    pub fn is_due_within(&self, now: Instant, horizon: Duration) -> bool {
        match self.predicted_next_access {
            Some(predicted) => predicted >= now && predicted <= now + horizon,
            None => false,
        }
    }
}
