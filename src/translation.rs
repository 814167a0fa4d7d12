//! Translation Resolver
//!
//! Resolves a property in the active language. For each node on the way up
//! (when recursive) the lookup order is:
//!
//! 1. `{alias}_{locale}` on the node itself
//! 2. the node's translation folder: the child whose `language` equals the
//!    locale, else the child whose `language` is the locale's two letter
//!    prefix
//! 3. `{alias}` on the node itself
//!
//! Only the folder location is cached. Values are always read fresh.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::cache::{Expiry, ResolverCaches};
use crate::config::ResolverConfig;
use crate::domain::ports::{ContentTree, LanguageCode, NodeId, RawValue};
use crate::domain::value::{has_content, is_blank, raw_text, PropertyValue};
use crate::locale::LocaleSelector;

/// Localized property lookups
#[derive(Clone)]
pub struct TranslationResolver {
    tree: Arc<dyn ContentTree>,
    locale: LocaleSelector,
    caches: Arc<ResolverCaches>,
    config: Arc<ResolverConfig>,
}

impl TranslationResolver {
    pub fn new(
        tree: Arc<dyn ContentTree>,
        locale: LocaleSelector,
        caches: Arc<ResolverCaches>,
        config: Arc<ResolverConfig>,
    ) -> Self {
        Self {
            tree,
            locale,
            caches,
            config,
        }
    }

    /// Resolve `alias` on `node` in the active request language.
    ///
    /// Returns `T::default()` when no node yields a usable value.
    #[instrument(skip(self), level = "debug")]
    pub fn resolve<T: PropertyValue>(&self, node: NodeId, alias: &str, recursive: bool) -> T {
        self.resolve_raw(node, alias, recursive, None)
            .and_then(|(_, raw)| T::from_raw(&raw))
            .unwrap_or_default()
    }

    /// Resolve `alias` on `node` in an explicit language
    pub fn resolve_in<T: PropertyValue>(
        &self,
        node: NodeId,
        alias: &str,
        recursive: bool,
        locale: &LanguageCode,
    ) -> T {
        self.resolve_raw(node, alias, recursive, Some(locale))
            .and_then(|(_, raw)| T::from_raw(&raw))
            .unwrap_or_default()
    }

    /// Find the raw value and the node that supplied it.
    ///
    /// `locale` defaults to the active request language. It is only
    /// computed when localization is not bypassed.
    pub fn resolve_raw(
        &self,
        node: NodeId,
        alias: &str,
        recursive: bool,
        locale: Option<&LanguageCode>,
    ) -> Option<(NodeId, RawValue)> {
        let locale = if self.locale.bypass_localization() {
            None
        } else {
            Some(locale.cloned().unwrap_or_else(|| self.locale.active_locale()))
        };

        let mut current = Some(node);
        while let Some(id) = current {
            if !self.tree.exists(id) {
                break;
            }
            if let Some(found) = self.lookup_on(id, alias, locale.as_ref()) {
                return Some(found);
            }
            if !recursive {
                break;
            }
            current = self.tree.parent(id);
        }
        None
    }

    fn lookup_on(
        &self,
        id: NodeId,
        alias: &str,
        locale: Option<&LanguageCode>,
    ) -> Option<(NodeId, RawValue)> {
        let sentinels = &self.config.empty_sentinels;

        if let Some(locale) = locale {
            let suffixed = format!("{}_{}", alias, locale);
            if let Some(raw) = self.tree.raw_property(id, &suffixed) {
                if !is_blank(&raw) {
                    return Some((id, raw));
                }
            }

            if let Some(translation) = self
                .translation_folder(id)
                .and_then(|folder| self.matching_translation(folder, locale))
            {
                if let Some(raw) = self.tree.raw_property(translation, alias) {
                    if has_content(&raw, sentinels) {
                        return Some((translation, raw));
                    }
                }
            }
        }

        self.tree
            .raw_property(id, alias)
            .filter(|raw| has_content(raw, sentinels))
            .map(|raw| (id, raw))
    }

    /// The translation node under `folder` for `locale`: exact match first,
    /// then a two letter entry matching a regional locale's prefix.
    pub fn matching_translation(&self, folder: NodeId, locale: &LanguageCode) -> Option<NodeId> {
        let candidates: Vec<(NodeId, String)> = self
            .tree
            .children(folder)
            .into_iter()
            .filter_map(|child| {
                self.tree
                    .raw_property(child, &self.config.language_property)
                    .as_ref()
                    .and_then(raw_text)
                    .map(|language| (child, language.trim().to_string()))
            })
            .collect();

        let best = candidates
            .iter()
            .find(|(_, language)| language.eq_ignore_ascii_case(locale.as_str()));
        if let Some((id, _)) = best {
            return Some(*id);
        }

        let primary = locale.primary()?;
        candidates
            .iter()
            .find(|(_, language)| language.len() == 2 && language.eq_ignore_ascii_case(primary))
            .map(|(id, _)| *id)
    }

    /// Locate the translation folder among the node's children.
    ///
    /// Cached per node: a found folder for the hit TTL, an absent one for
    /// the (shorter) miss TTL.
    pub fn translation_folder(&self, node: NodeId) -> Option<NodeId> {
        let expiry = Expiry::HitMiss {
            hit: self.config.translation_hit_ttl,
            miss: self.config.translation_miss_ttl,
        };
        let cache = self.caches.translation_folder();
        if let Some(folder) = cache.get_with_expiry(&node, expiry, Option::is_some) {
            debug!(node = %node, folder = ?folder, "Translation folder cache hit");
            return folder;
        }

        let node_type = self.tree.type_tag(node).unwrap_or_default();
        let tags = self.config.translation_folder_tags(&node_type);
        let folder = self.tree.children(node).into_iter().find(|child| {
            self.tree
                .type_tag(*child)
                .map(|tag| tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)))
                .unwrap_or(false)
        });

        debug!(node = %node, folder = ?folder, "Translation folder scanned");
        cache.insert(node, folder);
        folder
    }

    /// The locale selector this resolver reads the active language from
    pub fn locale(&self) -> &LocaleSelector {
        &self.locale
    }
}

impl std::fmt::Debug for TranslationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationResolver")
            .field("caches", &self.caches)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
