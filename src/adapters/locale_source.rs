//! Locale Source Adapters
//!
//! Implements the `LocaleSource` port with a settable static source and a
//! source built from an inbound request's path and query.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use crate::domain::ports::LocaleSource;

static URL_LANGUAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^/([a-z]{2}-[a-z]{2})(?:$|/|\?)").expect("Invalid URL language regex")
});

// =============================================================================
// Static Source
// =============================================================================

/// Locale inputs set directly by the caller
#[derive(Debug, Default)]
pub struct StaticLocaleSource {
    hint: RwLock<Option<String>>,
    languages: RwLock<Vec<String>>,
}

impl StaticLocaleSource {
    /// Create a source with the configured languages and no request hint
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hint: RwLock::new(None),
            languages: RwLock::new(languages.into_iter().map(Into::into).collect()),
        }
    }

    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        *self.hint.write() = Some(hint.into());
        self
    }

    /// Replace the current request hint
    pub fn set_hint(&self, hint: Option<String>) {
        *self.hint.write() = hint;
    }
}

impl LocaleSource for StaticLocaleSource {
    fn request_language_hint(&self) -> Option<String> {
        self.hint.read().clone()
    }

    fn configured_languages(&self) -> Vec<String> {
        self.languages.read().clone()
    }
}

// =============================================================================
// Request Source
// =============================================================================

/// Locale inputs of a single inbound request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLocaleSource {
    hint: Option<String>,
    languages: Vec<String>,
}

impl RequestLocaleSource {
    /// Read the language hint from a request's path and query.
    ///
    /// The `lang` query parameter wins; otherwise a leading `/xx-yy` path
    /// segment is used.
    pub fn from_request<I, S>(path_and_query: &str, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hint = query_language(path_and_query).or_else(|| path_language(path_and_query));
        Self {
            hint,
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

fn query_language(path_and_query: &str) -> Option<String> {
    let (_, query) = path_and_query.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| key.eq_ignore_ascii_case("lang"))
        .filter_map(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn path_language(path_and_query: &str) -> Option<String> {
    URL_LANGUAGE
        .captures(path_and_query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

impl LocaleSource for RequestLocaleSource {
    fn request_language_hint(&self) -> Option<String> {
        self.hint.clone()
    }

    fn configured_languages(&self) -> Vec<String> {
        self.languages.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
