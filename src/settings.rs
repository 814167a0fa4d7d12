//! Settings Resolver
//!
//! A setting is a node, named after its key, somewhere below a settings
//! container. Containers are children of ordinary nodes; a node uses the
//! container of its nearest ancestor-or-self that has one.
//!
//! Two caches back every lookup:
//!
//! - location: node id -> (container id, ttl). Every node visited before a
//!   container was found is filled in at once with that container.
//! - value: (container id, key, result type) -> value, fresh while
//!   `age <= ttl`. A result is cached against every container searched on
//!   the way to it, misses included (as the type's default). Each entry
//!   keeps the shortest ttl of the containers from its own up to the one
//!   that answered, so no container outlives the data it was read through.
//!
//! The ttl comes from the container's `defaultCacheDuration` (seconds) and
//! falls back to the configured default when absent or not positive.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::cache::{ResolverCaches, SettingKey, SettingValue, SettingsLocation};
use crate::config::ResolverConfig;
use crate::domain::ports::{ContentTree, NodeId};
use crate::domain::value::PropertyValue;
use crate::translation::TranslationResolver;

/// Setting lookups
#[derive(Clone)]
pub struct SettingsResolver {
    tree: Arc<dyn ContentTree>,
    translations: TranslationResolver,
    caches: Arc<ResolverCaches>,
    config: Arc<ResolverConfig>,
}

impl SettingsResolver {
    pub fn new(
        tree: Arc<dyn ContentTree>,
        translations: TranslationResolver,
        caches: Arc<ResolverCaches>,
        config: Arc<ResolverConfig>,
    ) -> Self {
        Self {
            tree,
            translations,
            caches,
            config,
        }
    }

    /// Resolve the setting `key` for `node`.
    ///
    /// Blank keys and settings that exist nowhere up the chain resolve to
    /// `T::default()`.
    #[instrument(skip(self), level = "debug")]
    pub fn resolve<T: PropertyValue>(&self, node: NodeId, key: &str) -> T {
        if key.trim().is_empty() {
            return T::default();
        }

        let mut pending_nodes: Vec<NodeId> = Vec::new();
        let mut visited_containers: Vec<SettingsLocation> = Vec::new();
        let mut current = Some(node);

        while let Some(id) = current {
            let location = match self
                .caches
                .settings_location()
                .get_fresh(&id, |location| Some(location.ttl))
            {
                Some(location) => Some(location),
                None => {
                    pending_nodes.push(id);
                    self.find_container(id)
                }
            };

            if let Some(location) = location {
                if !pending_nodes.is_empty() {
                    let filled = self
                        .caches
                        .settings_location()
                        .insert_many(pending_nodes.drain(..), location);
                    self.caches.counters().record_backfill(filled as u64);
                    debug!(container = %location.container, nodes = filled, "Settings location backfilled");
                }
                // Nodes between a container's owner and the next container
                // up map to the same container; search it once per walk.
                if !visited_containers
                    .iter()
                    .any(|visited| visited.container == location.container)
                {
                    visited_containers.push(location);

                    let cache_key = SettingKey::new::<T>(location.container, key);
                    if let Some(cached) = self
                        .caches
                        .settings_value()
                        .get_fresh(&cache_key, |entry| Some(entry.ttl()))
                    {
                        if let Some(value) = cached.downcast_ref::<T>() {
                            debug!(container = %location.container, key, "Setting cache hit");
                            return value.clone();
                        }
                    }

                    if let Some(setting) = self.find_setting(location.container, key) {
                        let value: T =
                            self.translations
                                .resolve(setting, &self.config.value_property, false);
                        self.store_for_containers(&visited_containers, key, value.clone());
                        debug!(container = %location.container, setting = %setting, key, "Setting resolved");
                        return value;
                    }
                }
            }

            current = self.tree.parent(id);
        }

        let value = T::default();
        if !visited_containers.is_empty() {
            let cached = self.store_for_containers(&visited_containers, key, value.clone());
            self.caches.counters().record_negative(cached as u64);
            debug!(key, containers = cached, "Setting not found, default cached");
        }
        value
    }

    /// Cache `value` as the answer for `key` at every searched container.
    ///
    /// Every node mapped to one of these containers walks the same ancestor
    /// chain above it, so the answer holds for all of them. `containers` is
    /// ordered innermost first; the last one answered.
    fn store_for_containers<T: PropertyValue>(
        &self,
        containers: &[SettingsLocation],
        key: &str,
        value: T,
    ) -> usize {
        let mut ttl = Duration::MAX;
        for location in containers.iter().rev() {
            ttl = ttl.min(location.ttl);
            self.caches.settings_value().insert(
                SettingKey::new::<T>(location.container, key),
                SettingValue::new(value.clone(), ttl),
            );
        }
        containers.len()
    }

    /// The settings container directly under `node`, with its cache ttl
    pub fn find_container(&self, node: NodeId) -> Option<SettingsLocation> {
        let container = self.tree.children(node).into_iter().find(|child| {
            self.tree
                .type_tag(*child)
                .map(|tag| tag.eq_ignore_ascii_case(&self.config.settings_type_tag))
                .unwrap_or(false)
        })?;
        Some(SettingsLocation {
            container,
            ttl: self.container_ttl(container),
        })
    }

    fn container_ttl(&self, container: NodeId) -> Duration {
        let seconds: Option<i64> =
            self.translations
                .resolve(container, &self.config.cache_duration_property, false);
        match seconds {
            Some(seconds) if seconds > 0 => Duration::from_secs(seconds as u64),
            _ => self.config.settings_fallback_ttl,
        }
    }

    fn find_setting(&self, container: NodeId, key: &str) -> Option<NodeId> {
        let key = key.to_lowercase();
        self.tree.descendants(container).find(|id| {
            self.tree
                .name(*id)
                .map(|name| name.to_lowercase() == key)
                .unwrap_or(false)
        })
    }
}

impl std::fmt::Debug for SettingsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsResolver")
            .field("caches", &self.caches)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
