//! Content Resolver
//!
//! The composition root: wires the ports and one shared [`ResolverCaches`]
//! into the locale, translation, settings and option resolvers, and adds
//! the helpers built on top of them (picked nodes, drop-downs, titles).
//!
//! # Example
//!
//! ```ignore
//! let resolver = ContentResolver::builder(Arc::new(tree))
//!     .with_config_source(Arc::new(EnvConfigSource::default()))
//!     .with_locale_source(Arc::new(StaticLocaleSource::new(["en-US", "es-MX"])))
//!     .build();
//!
//! let page_size: i64 = resolver.setting(node, "PageSize");
//! let heading: String = resolver.localized(node, "heading", true);
//! ```

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::adapters::{InMemoryOptionCatalog, StaticConfigSource, StaticLocaleSource};
use crate::cache::{CacheStats, Clock, ResolverCaches, SystemClock};
use crate::config::ResolverConfig;
use crate::domain::ports::{
    ConfigSource, ContentTree, LanguageCode, LocaleSource, NodeId, OptionLookup, RawValue,
};
use crate::domain::value::{has_content, is_blank, raw_text, PropertyValue};
use crate::locale::LocaleSelector;
use crate::options::OptionResolver;
use crate::settings::SettingsResolver;
use crate::translation::TranslationResolver;

static TITLE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\{(page|page-name|\*|name|parent|parent-name|parent-title)\}")
        .expect("Invalid title token regex")
});

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`ContentResolver`]. Only the content tree is required.
pub struct ContentResolverBuilder {
    tree: Arc<dyn ContentTree>,
    config_source: Option<Arc<dyn ConfigSource>>,
    option_lookup: Option<Arc<dyn OptionLookup>>,
    locale_source: Option<Arc<dyn LocaleSource>>,
    caches: Option<Arc<ResolverCaches>>,
    clock: Option<Arc<dyn Clock>>,
    config: ResolverConfig,
}

impl ContentResolverBuilder {
    pub fn with_config_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.config_source = Some(source);
        self
    }

    pub fn with_option_lookup(mut self, lookup: Arc<dyn OptionLookup>) -> Self {
        self.option_lookup = Some(lookup);
        self
    }

    pub fn with_locale_source(mut self, source: Arc<dyn LocaleSource>) -> Self {
        self.locale_source = Some(source);
        self
    }

    /// Share an existing cache store (its clock wins over [`Self::with_clock`])
    pub fn with_caches(mut self, caches: Arc<ResolverCaches>) -> Self {
        self.caches = Some(caches);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ContentResolver {
        let config = Arc::new(self.config);
        let caches = self.caches.unwrap_or_else(|| {
            let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
            Arc::new(ResolverCaches::new(clock))
        });
        let config_source = self
            .config_source
            .unwrap_or_else(|| Arc::new(StaticConfigSource::new()));
        let locale_source = self
            .locale_source
            .unwrap_or_else(|| Arc::new(StaticLocaleSource::default()));
        let option_lookup = self
            .option_lookup
            .unwrap_or_else(|| Arc::new(InMemoryOptionCatalog::new()));

        let locale = LocaleSelector::new(
            locale_source,
            config_source,
            caches.clone(),
            config.keys.clone(),
        );
        let translations = TranslationResolver::new(
            self.tree.clone(),
            locale.clone(),
            caches.clone(),
            config.clone(),
        );
        let settings = SettingsResolver::new(
            self.tree.clone(),
            translations.clone(),
            caches.clone(),
            config.clone(),
        );
        let options = OptionResolver::new(option_lookup, caches.clone());

        ContentResolver {
            tree: self.tree,
            caches,
            config,
            locale,
            translations,
            settings,
            options,
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Entry point for every lookup against one content tree
#[derive(Clone)]
pub struct ContentResolver {
    tree: Arc<dyn ContentTree>,
    caches: Arc<ResolverCaches>,
    config: Arc<ResolverConfig>,
    locale: LocaleSelector,
    translations: TranslationResolver,
    settings: SettingsResolver,
    options: OptionResolver,
}

impl ContentResolver {
    pub fn builder(tree: Arc<dyn ContentTree>) -> ContentResolverBuilder {
        ContentResolverBuilder {
            tree,
            config_source: None,
            option_lookup: None,
            locale_source: None,
            caches: None,
            clock: None,
            config: ResolverConfig::default(),
        }
    }

    pub fn tree(&self) -> &dyn ContentTree {
        self.tree.as_ref()
    }

    pub fn caches(&self) -> &Arc<ResolverCaches> {
        &self.caches
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn locale(&self) -> &LocaleSelector {
        &self.locale
    }

    pub fn translations(&self) -> &TranslationResolver {
        &self.translations
    }

    pub fn settings(&self) -> &SettingsResolver {
        &self.settings
    }

    pub fn options(&self) -> &OptionResolver {
        &self.options
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        self.caches.stats()
    }

    // =========================================================================
    // Core Lookups
    // =========================================================================

    /// Language of the current request
    pub fn active_locale(&self) -> LanguageCode {
        self.locale.active_locale()
    }

    /// Language for an explicit hint
    pub fn select_locale(&self, hint: Option<&str>) -> LanguageCode {
        self.locale.select_locale(hint)
    }

    pub fn available_languages(&self) -> Vec<LanguageCode> {
        self.locale.available_languages()
    }

    /// Localized property value in the request language
    pub fn localized<T: PropertyValue>(&self, node: NodeId, alias: &str, recursive: bool) -> T {
        self.translations.resolve(node, alias, recursive)
    }

    /// Localized property value in an explicit language
    pub fn localized_in<T: PropertyValue>(
        &self,
        node: NodeId,
        alias: &str,
        recursive: bool,
        locale: &LanguageCode,
    ) -> T {
        self.translations.resolve_in(node, alias, recursive, locale)
    }

    /// Setting value inherited from the nearest settings container
    pub fn setting<T: PropertyValue>(&self, node: NodeId, key: &str) -> T {
        self.settings.resolve(node, key)
    }

    pub fn resolve_option(&self, code: &str) -> String {
        self.options.resolve_option(code)
    }

    pub fn resolve_option_list(&self, raw: &str) -> Vec<String> {
        self.options.resolve_option_list(raw)
    }

    pub fn option_type_id(&self, type_name: &str) -> Option<i64> {
        self.options.option_type_id(type_name)
    }

    pub fn option_values_for_type(&self, type_name: &str) -> Vec<String> {
        self.options.option_values_for_type(type_name)
    }

    // =========================================================================
    // Picked Nodes And Drop-Downs
    // =========================================================================

    /// The node whose raw `alias` is set: `node` itself, or with `recursive`
    /// the nearest such ancestor-or-self.
    fn value_source(&self, node: NodeId, alias: &str, recursive: bool) -> Option<NodeId> {
        if !recursive {
            return self.tree.exists(node).then_some(node);
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if !self.tree.exists(id) {
                return None;
            }
            if self
                .tree
                .raw_property(id, alias)
                .map(|raw| !is_blank(&raw))
                .unwrap_or(false)
            {
                return Some(id);
            }
            current = self.tree.parent(id);
        }
        None
    }

    /// Ids chosen in a node picker property, in picked order
    pub fn picked_node_ids(&self, node: NodeId, alias: &str, recursive: bool) -> Vec<NodeId> {
        let Some(source) = self.value_source(node, alias, recursive) else {
            return Vec::new();
        };
        let raw: RawValue = self.translations.resolve(source, alias, false);
        parse_picked_ids(&raw)
    }

    /// Picked nodes that still exist, in picked order
    pub fn picked_nodes(&self, node: NodeId, alias: &str, recursive: bool) -> Vec<NodeId> {
        self.picked_node_ids(node, alias, recursive)
            .into_iter()
            .filter(|id| self.tree.exists(*id))
            .collect()
    }

    /// The first picked node that still exists
    pub fn picked_node(&self, node: NodeId, alias: &str, recursive: bool) -> Option<NodeId> {
        self.picked_nodes(node, alias, recursive).into_iter().next()
    }

    /// Selected drop-down value; an integer selection resolves through the
    /// option cache
    pub fn drop_down_value(&self, node: NodeId, alias: &str, recursive: bool) -> Option<String> {
        let text = self.drop_down_text(node, alias, recursive)?;
        if text.trim().parse::<i64>().is_ok() {
            Some(self.options.resolve_option(&text))
        } else {
            Some(text)
        }
    }

    /// Selected drop-down values of a multi-select
    pub fn drop_down_values(&self, node: NodeId, alias: &str, recursive: bool) -> Vec<String> {
        match self.drop_down_text(node, alias, recursive) {
            Some(text) => self.options.resolve_option_list(&text),
            None => Vec::new(),
        }
    }

    fn drop_down_text(&self, node: NodeId, alias: &str, recursive: bool) -> Option<String> {
        let source = self.value_source(node, alias, recursive)?;
        let raw: RawValue = self.translations.resolve(source, alias, false);
        match raw {
            RawValue::Array(items) => Some(
                items
                    .iter()
                    .filter_map(raw_text)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            other => raw_text(&other),
        }
    }

    // =========================================================================
    // Titles
    // =========================================================================

    /// The `title` property, or the node name when it is blank
    pub fn title(&self, node: NodeId) -> String {
        self.tree
            .raw_property(node, &self.config.title_property)
            .filter(|raw| has_content(raw, &self.config.empty_sentinels))
            .and_then(|raw| raw_text(&raw))
            .unwrap_or_else(|| self.tree.name(node).unwrap_or_default())
    }

    /// Title for the browser window.
    ///
    /// The localized page title, else the parent's (inherited) title
    /// template, with `{page}`, `{parent}` and `{parent-title}` style
    /// tokens replaced. Falls back to the node name.
    pub fn browser_title(&self, node: NodeId) -> String {
        if !self.tree.exists(node) {
            return String::new();
        }

        let page_title: String =
            self.translations
                .resolve(node, &self.config.page_title_property, false);
        let parent = self.tree.parent(node);

        let template = match parent {
            Some(parent) if page_title.trim().is_empty() => self.translations.resolve(
                parent,
                &self.config.page_title_template_property,
                true,
            ),
            _ => page_title,
        };

        let title = self.replace_title_tokens(&template, node, parent);
        if title.trim().is_empty() {
            debug!(node = %node, "Browser title falls back to node name");
            self.tree.name(node).unwrap_or_default()
        } else {
            title
        }
    }

    fn replace_title_tokens(&self, template: &str, node: NodeId, parent: Option<NodeId>) -> String {
        if template.trim().is_empty() {
            return template.to_string();
        }
        TITLE_TOKEN
            .replace_all(template, |caps: &Captures| {
                match caps[1].to_ascii_lowercase().as_str() {
                    "page" | "page-name" | "*" | "name" => self.tree.name(node).unwrap_or_default(),
                    "parent" | "parent-name" => parent
                        .and_then(|p| self.tree.name(p))
                        .unwrap_or_default(),
                    "parent-title" => parent
                        .map(|p| self.browser_title(p))
                        .unwrap_or_default(),
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Node ids from a picker value: an integer, a CSV of integers, or a JSON
/// array (native or encoded as text).
pub fn parse_picked_ids(raw: &RawValue) -> Vec<NodeId> {
    let ids: Vec<i64> = match raw {
        RawValue::String(text) if text.trim_start().starts_with('[') => {
            match serde_json::from_str::<RawValue>(text) {
                Ok(parsed) => return parse_picked_ids(&parsed),
                Err(_) => Vec::new(),
            }
        }
        other => Vec::<i64>::from_raw(other).unwrap_or_default(),
    };
    ids.into_iter().map(NodeId).collect()
}

impl std::fmt::Debug for ContentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentResolver")
            .field("caches", &self.caches)
            .field("config", &self.config)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
