//! TTL Map
//!
//! Mutex-guarded map of [`CacheEntry`] values. Freshness is decided per
//! lookup by the caller, because the TTL can depend on the entry itself
//! (a translation folder hit lives longer than a miss) or on data found
//! elsewhere (a settings container's own cache duration).
//!
//! The guard is only held for the map operation itself. Callers compute
//! missing values outside the lock and commit them with [`TtlCache::insert`];
//! concurrent callers may compute the same miss twice and the last write
//! wins.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::clock::Clock;
use super::entry::CacheEntry;
use super::metrics::{CacheCounters, CacheSnapshot};

/// Expiry rule for a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Entries never expire
    Never,
    /// Every entry lives for the same duration
    After(Duration),
    /// Present values and absent values live for different durations
    HitMiss { hit: Duration, miss: Duration },
}

impl Expiry {
    /// TTL for an entry; `None` means it never expires
    pub fn ttl(&self, is_hit: bool) -> Option<Duration> {
        match self {
            Expiry::Never => None,
            Expiry::After(ttl) => Some(*ttl),
            Expiry::HitMiss { hit, miss } => Some(if is_hit { *hit } else { *miss }),
        }
    }
}

/// Keyed cache with per-lookup TTL
pub struct TtlCache<K, V> {
    name: &'static str,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
    counters: CacheCounters,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache reading time from `clock`
    pub fn new(name: &'static str, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
            clock,
            counters: CacheCounters::new(),
        }
    }

    /// Cache name (for logs)
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current time of this cache's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Get a value if it is still fresh.
    ///
    /// `ttl` receives the cached value and returns its time-to-live, or
    /// `None` for no expiry. Stale entries stay in place until overwritten.
    pub fn get_fresh<F>(&self, key: &K, ttl: F) -> Option<V>
    where
        F: FnOnce(&V) -> Option<Duration>,
    {
        let now = self.clock.now();
        let guard = self.entries.lock();
        match guard.get(key) {
            Some(entry) => {
                let fresh = match ttl(entry.value()) {
                    Some(ttl) => entry.is_fresh(now, ttl),
                    None => true,
                };
                if fresh {
                    self.counters.record_hit();
                    Some(entry.value().clone())
                } else {
                    self.counters.record_expired();
                    None
                }
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    /// Get a value under a fixed expiry rule; `is_hit` classifies the value
    pub fn get_with_expiry(&self, key: &K, expiry: Expiry, is_hit: impl FnOnce(&V) -> bool) -> Option<V> {
        self.get_fresh(key, |value| expiry.ttl(is_hit(value)))
    }

    /// Read an entry without freshness checks or metrics
    pub fn peek(&self, key: &K) -> Option<CacheEntry<V>> {
        self.entries.lock().get(key).cloned()
    }

    /// Store a value stamped with the current time
    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut guard = self.entries.lock();
        Self::commit(&mut guard, key, value, now);
        self.counters.record_stores(1);
    }

    /// Store the same value under many keys with one lock acquisition
    pub fn insert_many<I>(&self, keys: I, value: V) -> usize
    where
        I: IntoIterator<Item = K>,
    {
        let now = self.clock.now();
        let mut guard = self.entries.lock();
        let mut stored = 0;
        for key in keys {
            Self::commit(&mut guard, key, value.clone(), now);
            stored += 1;
        }
        self.counters.record_stores(stored as u64);
        stored
    }

    /// Stamps never move backwards for a key, even if the clock does
    fn commit(map: &mut HashMap<K, CacheEntry<V>>, key: K, value: V, now: DateTime<Utc>) {
        let stamp = match map.get(&key) {
            Some(existing) if existing.stored_at() > now => existing.stored_at(),
            _ => now,
        };
        map.insert(key, CacheEntry::new(value, stamp));
    }

    /// Remove an entry
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.lock().remove(key).map(CacheEntry::into_value)
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss counters
    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    /// Counters plus current size
    pub fn snapshot(&self) -> CacheSnapshot {
        self.counters.snapshot(self.len())
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
