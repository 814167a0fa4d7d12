//! Locale Selector
//!
//! Picks the language every localized lookup runs under: the request hint
//! when it looks like a language code, otherwise the process default.
//! The default is computed once per cache store and never recomputed.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::cache::ResolverCaches;
use crate::config::ConfigKeys;
use crate::domain::ports::{ConfigSource, LanguageCode, LocaleSource};

/// Language used when neither configuration nor the language list name one
pub const FALLBACK_LANGUAGE: &str = "en";

static LANGUAGE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z]{2}(-[a-z]{2})?$").expect("Invalid language code regex"));

/// Normalise a language hint to `xx` or `xx-YY`.
///
/// Returns `None` when the hint is not a 2 or 2+2 letter code.
pub fn normalize_language(hint: &str) -> Option<LanguageCode> {
    let hint = hint.trim();
    if !LANGUAGE_CODE.is_match(hint) {
        return None;
    }
    let code = match hint.split_once('-') {
        Some((language, region)) => format!(
            "{}-{}",
            language.to_ascii_lowercase(),
            region.to_ascii_uppercase()
        ),
        None => hint.to_ascii_lowercase(),
    };
    Some(LanguageCode::new(code))
}

/// Resolves the active language
#[derive(Clone)]
pub struct LocaleSelector {
    source: Arc<dyn LocaleSource>,
    config: Arc<dyn ConfigSource>,
    caches: Arc<ResolverCaches>,
    keys: ConfigKeys,
}

impl LocaleSelector {
    pub fn new(
        source: Arc<dyn LocaleSource>,
        config: Arc<dyn ConfigSource>,
        caches: Arc<ResolverCaches>,
        keys: ConfigKeys,
    ) -> Self {
        Self {
            source,
            config,
            caches,
            keys,
        }
    }

    /// Language for an explicit hint, falling back to the default language
    pub fn select_locale(&self, hint: Option<&str>) -> LanguageCode {
        match hint.and_then(normalize_language) {
            Some(code) => code,
            None => self.default_language(),
        }
    }

    /// Language of the current request
    pub fn active_locale(&self) -> LanguageCode {
        let hint = self.source.request_language_hint();
        self.select_locale(hint.as_deref())
    }

    /// The process default language (memoized).
    ///
    /// Configuration first, then the first available language, then
    /// [`FALLBACK_LANGUAGE`]. A failing configuration read counts as absent.
    pub fn default_language(&self) -> LanguageCode {
        self.caches.default_language(|| {
            let configured = match self.config.get_string(&self.keys.default_language) {
                Ok(value) => value.filter(|v| !v.trim().is_empty()),
                Err(e) => {
                    warn!(key = %self.keys.default_language, error = %e, "Default language unavailable, using language list");
                    None
                }
            };

            let language = match configured {
                Some(value) => {
                    normalize_language(&value).unwrap_or_else(|| LanguageCode::new(value.trim()))
                }
                None => match self.available_languages().into_iter().next() {
                    Some(first) => first,
                    None => {
                        warn!(fallback = FALLBACK_LANGUAGE, "No languages configured");
                        LanguageCode::from(FALLBACK_LANGUAGE)
                    }
                },
            };
            debug!(language = %language, "Default language selected");
            language
        })
    }

    /// Configured languages as lookup codes.
    ///
    /// Culture aliases are cut to their two letter language unless the
    /// culture flag is set; duplicates are dropped keeping first position.
    pub fn available_languages(&self) -> Vec<LanguageCode> {
        let use_culture = self.flag(&self.keys.use_culture_in_language_code);
        let mut languages: Vec<LanguageCode> = Vec::new();
        for alias in self.source.configured_languages() {
            let alias = alias.trim();
            if alias.is_empty() {
                continue;
            }
            let code = if use_culture {
                alias.to_string()
            } else {
                alias.chars().take(2).collect()
            };
            let code = LanguageCode::new(code);
            if !languages.contains(&code) {
                languages.push(code);
            }
        }
        languages
    }

    /// Whether localization is bypassed (memoized)
    pub fn bypass_localization(&self) -> bool {
        self.caches
            .bypass_localization(|| self.flag(&self.keys.bypass_localization))
    }

    fn flag(&self, key: &str) -> bool {
        self.config.get_bool(key).unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "Configuration flag unavailable, assuming false");
            false
        })
    }
}

impl std::fmt::Debug for LocaleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleSelector")
            .field("keys", &self.keys)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{StaticConfigSource, StaticLocaleSource};
    use crate::error::{Error, Result};
    use proptest::prelude::*;

    struct BrokenConfig;

    impl ConfigSource for BrokenConfig {
        fn get_bool(&self, key: &str) -> Result<bool> {
            Err(Error::ConfigurationUnavailable {
                key: key.to_string(),
                reason: "config store offline".to_string(),
            })
        }

        fn get_string(&self, key: &str) -> Result<Option<String>> {
            Err(Error::ConfigurationUnavailable {
                key: key.to_string(),
                reason: "config store offline".to_string(),
            })
        }
    }

    fn selector(
        languages: &[&str],
        config: Arc<dyn ConfigSource>,
    ) -> (LocaleSelector, Arc<StaticLocaleSource>) {
        let source = Arc::new(StaticLocaleSource::new(languages.iter().copied()));
        let selector = LocaleSelector::new(
            source.clone(),
            config,
            Arc::new(ResolverCaches::default()),
            ConfigKeys::default(),
        );
        (selector, source)
    }

    // =========================================================================
    // Normalisation
    // =========================================================================

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("ES-mx").unwrap().as_str(), "es-MX");
        assert_eq!(normalize_language("FR").unwrap().as_str(), "fr");
        assert_eq!(normalize_language(" de ").unwrap().as_str(), "de");
        assert!(normalize_language("english").is_none());
        assert!(normalize_language("es_MX").is_none());
        assert!(normalize_language("").is_none());
    }

    proptest! {
        #[test]
        fn prop_normalized_codes_have_canonical_case(
            language in "[a-zA-Z]{2}",
            region in proptest::option::of("[a-zA-Z]{2}"),
        ) {
            let hint = match &region {
                Some(region) => format!("{}-{}", language, region),
                None => language.clone(),
            };
            let code = normalize_language(&hint).unwrap();
            prop_assert_eq!(&code.as_str()[..2], language.to_ascii_lowercase());
            if let Some(region) = region {
                prop_assert_eq!(&code.as_str()[3..], region.to_ascii_uppercase());
                prop_assert!(code.is_regional());
            } else {
                prop_assert_eq!(code.as_str().len(), 2);
            }
        }

        #[test]
        fn prop_non_codes_rejected(hint in "[a-z]{3,8}") {
            prop_assert!(normalize_language(&hint).is_none());
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    #[test]
    fn test_hint_wins_over_default() {
        let (selector, source) = selector(&["en-US"], Arc::new(StaticConfigSource::new()));
        source.set_hint(Some("es-mx".to_string()));
        assert_eq!(selector.active_locale().as_str(), "es-MX");
    }

    #[test]
    fn test_invalid_hint_uses_default() {
        let config = Arc::new(StaticConfigSource::from_pairs([("default_language", "fr")]));
        let (selector, _) = selector(&["en-US"], config);
        assert_eq!(selector.select_locale(Some("spanish")).as_str(), "fr");
        assert_eq!(selector.select_locale(None).as_str(), "fr");
    }

    #[test]
    fn test_default_from_language_list() {
        let (selector, _) = selector(&["es-MX", "en-US"], Arc::new(StaticConfigSource::new()));
        assert_eq!(selector.default_language().as_str(), "es");
    }

    #[test]
    fn test_config_failure_falls_back_to_language_list() {
        let (selector, _) = selector(&["de-DE"], Arc::new(BrokenConfig));
        assert_eq!(selector.default_language().as_str(), "de");
        assert!(!selector.bypass_localization());
    }

    #[test]
    fn test_empty_language_list_falls_back() {
        let (selector, _) = selector(&[], Arc::new(StaticConfigSource::new()));
        assert_eq!(selector.default_language().as_str(), FALLBACK_LANGUAGE);
    }

    #[test]
    fn test_default_language_memoized() {
        let config = Arc::new(StaticConfigSource::from_pairs([("default_language", "fr")]));
        let (selector, _) = selector(&["en-US"], config.clone());
        assert_eq!(selector.default_language().as_str(), "fr");

        config.set("default_language", "it");
        assert_eq!(selector.default_language().as_str(), "fr");
    }

    // =========================================================================
    // Language List
    // =========================================================================

    #[test]
    fn test_available_languages_truncated_and_deduped() {
        let (selector, _) = selector(
            &["en-US", "en-GB", "es-MX", "es-ES"],
            Arc::new(StaticConfigSource::new()),
        );
        let codes: Vec<String> = selector
            .available_languages()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(codes, vec!["en", "es"]);
    }

    #[test]
    fn test_available_languages_with_culture() {
        let config = Arc::new(StaticConfigSource::from_pairs([(
            "use_culture_in_language_code",
            "true",
        )]));
        let (selector, _) = selector(&["en-US", "en-GB", "en-US"], config);
        let codes: Vec<String> = selector
            .available_languages()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(codes, vec!["en-US", "en-GB"]);
    }

    #[test]
    fn test_bypass_flag_memoized() {
        let config = Arc::new(StaticConfigSource::from_pairs([("bypass_localization", "true")]));
        let (selector, _) = selector(&["en"], config.clone());
        assert!(selector.bypass_localization());
        config.set("bypass_localization", "false");
        assert!(selector.bypass_localization());
    }
}
