//! Resolver Configuration
//!
//! Every constant the resolvers depend on, with defaults that match the
//! content conventions of the tree (reserved type tags, property aliases,
//! configuration keys). Loadable from YAML/JSON; durations are integer
//! seconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// Default values
const DEFAULT_SETTINGS_FALLBACK_TTL_SECS: u64 = 5 * 60;
const DEFAULT_TRANSLATION_HIT_TTL_SECS: u64 = 5 * 60;
const DEFAULT_TRANSLATION_MISS_TTL_SECS: u64 = 60;

/// Configuration for the resolvers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// TTL for settings entries when the container has no usable
    /// `defaultCacheDuration`
    #[serde(with = "duration_secs")]
    pub settings_fallback_ttl: Duration,

    /// How long a found translation folder is trusted
    #[serde(with = "duration_secs")]
    pub translation_hit_ttl: Duration,

    /// How long a missing translation folder is trusted
    #[serde(with = "duration_secs")]
    pub translation_miss_ttl: Duration,

    /// Type tag of settings container nodes
    pub settings_type_tag: String,

    /// Property holding a setting node's value
    pub value_property: String,

    /// Property on a settings container holding its cache duration (seconds)
    pub cache_duration_property: String,

    /// Property on a translation node holding its language code
    pub language_property: String,

    /// Property holding a node's title
    pub title_property: String,

    /// Property holding a node's browser title
    pub page_title_property: String,

    /// Property holding the title template applied to children
    pub page_title_template_property: String,

    /// Raw encodings that count as "no value"
    pub empty_sentinels: Vec<String>,

    /// Configuration keys read through the `ConfigSource` port
    pub keys: ConfigKeys,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            settings_fallback_ttl: Duration::from_secs(DEFAULT_SETTINGS_FALLBACK_TTL_SECS),
            translation_hit_ttl: Duration::from_secs(DEFAULT_TRANSLATION_HIT_TTL_SECS),
            translation_miss_ttl: Duration::from_secs(DEFAULT_TRANSLATION_MISS_TTL_SECS),
            settings_type_tag: "Settings".to_string(),
            value_property: "value".to_string(),
            cache_duration_property: "defaultCacheDuration".to_string(),
            language_property: "language".to_string(),
            title_property: "title".to_string(),
            page_title_property: "pageTitle".to_string(),
            page_title_template_property: "pageTitleTemplate".to_string(),
            empty_sentinels: vec![
                "Content,False,,,".to_string(),
                "<items />".to_string(),
                "<values />".to_string(),
            ],
            keys: ConfigKeys::default(),
        }
    }
}

impl ResolverConfig {
    /// Load from a YAML document (JSON is valid YAML).
    pub fn from_yaml_str(text: &str) -> crate::error::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Type tags accepted as the translation folder of a node with `node_type`.
    pub fn translation_folder_tags(&self, node_type: &str) -> [String; 2] {
        [
            format!("{}_TranslationFolder", node_type),
            format!("{}TranslationFolder", node_type),
        ]
    }
}

/// Names of the configuration keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigKeys {
    /// Flag that skips all localization lookups
    pub bypass_localization: String,
    /// Default language when the request carries no hint
    pub default_language: String,
    /// Keep full culture codes (`es-MX`) in the language list instead of
    /// truncating to `es`
    pub use_culture_in_language_code: String,
}

impl Default for ConfigKeys {
    fn default() -> Self {
        Self {
            bypass_localization: "bypass_localization".to_string(),
            default_language: "default_language".to_string(),
            use_culture_in_language_code: "use_culture_in_language_code".to_string(),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
