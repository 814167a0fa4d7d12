//! Resolver Cache Store
//!
//! The single injectable object that owns every cache the resolvers share.
//! One store is built at the composition root and handed to all resolvers
//! as an `Arc`; tests build their own for isolation.

use std::any::{Any, TypeId};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use super::clock::{Clock, SystemClock};
use super::metrics::{CacheCounters, CacheStats, ResolverCounters};
use super::ttl::TtlCache;
use crate::domain::ports::{LanguageCode, NodeId, OptionDefinition};

/// Where the nearest settings container of a node lives, and how long
/// that answer (and values read from the container) may be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsLocation {
    pub container: NodeId,
    pub ttl: Duration,
}

/// Settings value cache key. The same setting read as two result types
/// is two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingKey {
    pub container: NodeId,
    pub key: String,
    pub type_id: TypeId,
}

impl SettingKey {
    pub fn new<T: 'static>(container: NodeId, key: &str) -> Self {
        Self {
            container,
            key: key.to_string(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// Type-erased cached setting value, with the ttl of the container the
/// value was read from
#[derive(Clone)]
pub struct SettingValue {
    value: Arc<dyn Any + Send + Sync>,
    ttl: Duration,
}

impl SettingValue {
    pub fn new<T: Any + Send + Sync>(value: T, ttl: Duration) -> Self {
        Self {
            value: Arc::new(value),
            ttl,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// How long the entry may be trusted
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingValue").field("ttl", &self.ttl).finish()
    }
}

/// Process-wide resolver caches
pub struct ResolverCaches {
    clock: Arc<dyn Clock>,
    settings_location: TtlCache<NodeId, SettingsLocation>,
    settings_value: TtlCache<SettingKey, SettingValue>,
    translation_folder: TtlCache<NodeId, Option<NodeId>>,

    // Options never expire
    options: DashMap<i64, String>,
    option_counters: CacheCounters,
    option_types: DashMap<String, Vec<String>>,
    option_definitions: Mutex<Option<Arc<Vec<OptionDefinition>>>>,

    bypass_localization: OnceCell<bool>,
    default_language: OnceCell<LanguageCode>,

    counters: ResolverCounters,
}

impl Default for ResolverCaches {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ResolverCaches {
    /// Create an empty store reading time from `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            settings_location: TtlCache::new("settings_location", clock.clone()),
            settings_value: TtlCache::new("settings_value", clock.clone()),
            translation_folder: TtlCache::new("translation_folder", clock.clone()),
            clock,
            options: DashMap::new(),
            option_counters: CacheCounters::new(),
            option_types: DashMap::new(),
            option_definitions: Mutex::new(None),
            bypass_localization: OnceCell::new(),
            default_language: OnceCell::new(),
            counters: ResolverCounters::default(),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// node id -> nearest settings container
    pub fn settings_location(&self) -> &TtlCache<NodeId, SettingsLocation> {
        &self.settings_location
    }

    /// (container, key, type) -> value
    pub fn settings_value(&self) -> &TtlCache<SettingKey, SettingValue> {
        &self.settings_value
    }

    /// node id -> translation folder (or its absence)
    pub fn translation_folder(&self) -> &TtlCache<NodeId, Option<NodeId>> {
        &self.translation_folder
    }

    pub fn counters(&self) -> &ResolverCounters {
        &self.counters
    }

    // =========================================================================
    // Option Caches
    // =========================================================================

    /// Cached display string of an option code
    pub fn option(&self, code: i64) -> Option<String> {
        match self.options.get(&code) {
            Some(value) => {
                self.option_counters.record_hit();
                Some(value.clone())
            }
            None => {
                self.option_counters.record_miss();
                None
            }
        }
    }

    pub fn store_option(&self, code: i64, display: String) {
        self.options.insert(code, display);
        self.option_counters.record_stores(1);
    }

    pub fn option_counters(&self) -> &CacheCounters {
        &self.option_counters
    }

    /// Cached display strings of every option of a type (lowercased name)
    pub fn option_type_values(&self, type_name: &str) -> Option<Vec<String>> {
        self.option_types
            .get(&type_name.to_lowercase())
            .map(|values| values.clone())
    }

    pub fn store_option_type_values(&self, type_name: &str, values: Vec<String>) {
        self.option_types.insert(type_name.to_lowercase(), values);
    }

    /// Option definitions, if a load has succeeded
    pub fn option_definitions(&self) -> Option<Arc<Vec<OptionDefinition>>> {
        self.option_definitions.lock().clone()
    }

    pub fn store_option_definitions(&self, definitions: Vec<OptionDefinition>) -> Arc<Vec<OptionDefinition>> {
        let definitions = Arc::new(definitions);
        *self.option_definitions.lock() = Some(definitions.clone());
        definitions
    }

    // =========================================================================
    // Memoized Flags
    // =========================================================================

    /// The bypass-localization flag, computed by `init` on first use
    pub fn bypass_localization(&self, init: impl FnOnce() -> bool) -> bool {
        *self.bypass_localization.get_or_init(init)
    }

    /// The default language, computed by `init` on first use
    pub fn default_language(&self, init: impl FnOnce() -> LanguageCode) -> LanguageCode {
        self.default_language.get_or_init(init).clone()
    }

    // =========================================================================
    // Stats
    // =========================================================================

    /// Snapshot of every cache for diagnostics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            settings_location: self.settings_location.snapshot(),
            settings_value: self.settings_value.snapshot(),
            translation_folder: self.translation_folder.snapshot(),
            options: self.option_counters.snapshot(self.options.len()),
            option_types: self.option_types.len(),
            backfilled_nodes: self.counters.backfilled_nodes(),
            negative_entries: self.counters.negative_entries(),
            swallowed_faults: self.counters.swallowed_faults(),
        }
    }
}

impl std::fmt::Debug for ResolverCaches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverCaches")
            .field("settings_location", &self.settings_location)
            .field("settings_value", &self.settings_value)
            .field("translation_folder", &self.translation_folder)
            .field("options", &self.options.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;

    #[test]
    fn test_setting_key_distinguishes_types() {
        let a = SettingKey::new::<String>(NodeId(1), "MaxItems");
        let b = SettingKey::new::<i64>(NodeId(1), "MaxItems");
        assert_ne!(a, b);
        assert_eq!(a, SettingKey::new::<String>(NodeId(1), "MaxItems"));
    }

    #[test]
    fn test_type_erased_settings_roundtrip() {
        let caches = ResolverCaches::new(Arc::new(ManualClock::default()));
        let key = SettingKey::new::<i64>(NodeId(1), "MaxItems");
        caches
            .settings_value()
            .insert(key.clone(), SettingValue::new(10i64, Duration::from_secs(5)));

        let value = caches
            .settings_value()
            .get_fresh(&key, |entry| Some(entry.ttl()))
            .unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&10));
        assert_eq!(value.downcast_ref::<String>(), None);
        assert_eq!(value.ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_option_cache_counts() {
        let caches = ResolverCaches::default();
        assert_eq!(caches.option(3), None);
        caches.store_option(3, "Red".to_string());
        assert_eq!(caches.option(3), Some("Red".to_string()));

        let stats = caches.stats();
        assert_eq!(stats.options.entries, 1);
        assert_eq!(stats.options.hits, 1);
        assert_eq!(stats.options.misses, 1);
    }

    #[test]
    fn test_option_types_case_insensitive() {
        let caches = ResolverCaches::default();
        caches.store_option_type_values("Colours", vec!["Red".to_string()]);
        assert_eq!(
            caches.option_type_values("colours"),
            Some(vec!["Red".to_string()])
        );
    }

    #[test]
    fn test_memoized_flags_computed_once() {
        let caches = ResolverCaches::default();
        assert!(caches.bypass_localization(|| true));
        assert!(caches.bypass_localization(|| false));

        assert_eq!(caches.default_language(|| "es".into()).as_str(), "es");
        assert_eq!(caches.default_language(|| "fr".into()).as_str(), "es");
    }

    #[test]
    fn test_option_definitions_unset_until_stored() {
        let caches = ResolverCaches::default();
        assert!(caches.option_definitions().is_none());
        caches.store_option_definitions(vec![OptionDefinition {
            name: "Colours".to_string(),
            id: 5,
        }]);
        assert_eq!(caches.option_definitions().unwrap().len(), 1);
    }
}
