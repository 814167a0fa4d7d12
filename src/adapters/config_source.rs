//! Configuration Source Adapters
//!
//! Implements the `ConfigSource` port from a static key/value map or from
//! process environment variables.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use parking_lot::RwLock;

use crate::domain::ports::{ConfigSource, RawValue};
use crate::domain::value::raw_text;
use crate::error::{Error, Result};

/// Environment variable prefix used by [`EnvConfigSource::default`]
pub const ENV_PREFIX: &str = "ARBORIST_";

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

// =============================================================================
// Static Source
// =============================================================================

/// Configuration held in a map.
///
/// Loadable from a flat YAML/JSON document of scalar values:
///
/// ```yaml
/// bypass_localization: false
/// default_language: es-MX
/// ```
#[derive(Debug, Default)]
pub struct StaticConfigSource {
    values: RwLock<HashMap<String, String>>,
}

impl StaticConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    /// Parse a flat YAML (or JSON) document; null values are skipped
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let document: BTreeMap<String, RawValue> = serde_yaml::from_str(text)?;
        Ok(Self::from_pairs(
            document
                .into_iter()
                .filter_map(|(key, value)| raw_text(&value).map(|text| (key, text))),
        ))
    }

    /// Load a document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    /// Set or replace a value
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

impl ConfigSource for StaticConfigSource {
    fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(self
            .values
            .read()
            .get(key)
            .map(|value| parse_flag(value))
            .unwrap_or(false))
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }
}

// =============================================================================
// Environment Source
// =============================================================================

/// Configuration read from environment variables.
///
/// Key `default_language` maps to `ARBORIST_DEFAULT_LANGUAGE`.
#[derive(Debug, Clone)]
pub struct EnvConfigSource {
    prefix: String,
}

impl Default for EnvConfigSource {
    fn default() -> Self {
        Self::new(ENV_PREFIX)
    }
}

impl EnvConfigSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name for a key
    pub fn variable_name(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

impl ConfigSource for EnvConfigSource {
    fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key)?.map(|v| parse_flag(&v)).unwrap_or(false))
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        match std::env::var(self.variable_name(key)) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(Error::ConfigurationUnavailable {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
