//! Cache Metrics Collection
//!
//! Per-cache hit/miss counters and a serializable snapshot of all resolver
//! caches for diagnostics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Hit/miss counters for a single cache
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    stores: AtomicU64,
}

impl CacheCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A stale entry was found; counts as a miss as well
    pub fn record_expired(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
        self.record_miss();
    }

    pub fn record_stores(&self, count: u64) {
        self.stores.fetch_add(count, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn expired(&self) -> u64 {
        self.expired.load(Ordering::Relaxed)
    }

    pub fn stores(&self) -> u64 {
        self.stores.load(Ordering::Relaxed)
    }

    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Snapshot these counters together with the current entry count
    pub fn snapshot(&self, entries: usize) -> CacheSnapshot {
        CacheSnapshot {
            entries,
            hits: self.hits(),
            misses: self.misses(),
            expired: self.expired(),
            stores: self.stores(),
            hit_ratio: self.hit_ratio(),
        }
    }
}

/// Resolver-level counters that are not tied to one cache
#[derive(Debug, Default)]
pub struct ResolverCounters {
    backfilled_nodes: AtomicU64,
    negative_entries: AtomicU64,
    swallowed_faults: AtomicU64,
}

impl ResolverCounters {
    /// Nodes whose settings container was filled in by a later ancestor hit
    pub fn record_backfill(&self, nodes: u64) {
        self.backfilled_nodes.fetch_add(nodes, Ordering::Relaxed);
    }

    /// Default values cached for missing settings
    pub fn record_negative(&self, entries: u64) {
        self.negative_entries.fetch_add(entries, Ordering::Relaxed);
    }

    /// Port failures that were logged and degraded instead of propagated
    pub fn record_swallowed_fault(&self) {
        self.swallowed_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn backfilled_nodes(&self) -> u64 {
        self.backfilled_nodes.load(Ordering::Relaxed)
    }

    pub fn negative_entries(&self) -> u64 {
        self.negative_entries.load(Ordering::Relaxed)
    }

    pub fn swallowed_faults(&self) -> u64 {
        self.swallowed_faults.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of one cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheSnapshot {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub stores: u64,
    pub hit_ratio: f64,
}

/// Point-in-time view of every resolver cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub settings_location: CacheSnapshot,
    pub settings_value: CacheSnapshot,
    pub translation_folder: CacheSnapshot,
    pub options: CacheSnapshot,
    pub option_types: usize,
    pub backfilled_nodes: u64,
    pub negative_entries: u64,
    pub swallowed_faults: u64,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = CacheCounters::new();
        assert_eq!(counters.hits(), 0);
        assert_eq!(counters.misses(), 0);
        assert_eq!(counters.hit_ratio(), 0.0);
    }

    #[test]
    fn test_hit_ratio() {
        let counters = CacheCounters::new();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        assert!((counters.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_expired_counts_as_miss() {
        let counters = CacheCounters::new();
        counters.record_expired();
        assert_eq!(counters.expired(), 1);
        assert_eq!(counters.misses(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let counters = CacheCounters::new();
        counters.record_stores(4);
        let snapshot = counters.snapshot(4);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["entries"], 4);
        assert_eq!(json["stores"], 4);
    }

    #[test]
    fn test_resolver_counters() {
        let counters = ResolverCounters::default();
        counters.record_backfill(3);
        counters.record_negative(2);
        counters.record_swallowed_fault();
        assert_eq!(counters.backfilled_nodes(), 3);
        assert_eq!(counters.negative_entries(), 2);
        assert_eq!(counters.swallowed_faults(), 1);
    }
}
