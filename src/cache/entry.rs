//! Cache Entry Types
//!
//! A cached value stamped with the time it was stored.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Cached value plus its store timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Create a new entry
    pub fn new(value: V, stored_at: DateTime<Utc>) -> Self {
        Self { value, stored_at }
    }

    /// Get the cached value
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consume the entry and return the value
    pub fn into_value(self) -> V {
        self.value
    }

    /// When the value was stored
    #[inline]
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Age of the entry at `now`. A clock that went backwards reads as zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// True while `age <= ttl`
    #[inline]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) <= ttl
    }
}

// =============================================================================
// Tests
// =============================================================================
