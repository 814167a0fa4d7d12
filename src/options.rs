//! Option Resolver
//!
//! Turns option codes into display strings. Codes are integers, alone or
//! as a comma separated list; anything else is already a display value and
//! passes through untouched.
//!
//! Resolved codes are cached for the life of the cache store. Lookup
//! failures (including the known spurious "no matching element" fault)
//! are logged and answered with the unresolved input, and never cached.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::cache::ResolverCaches;
use crate::domain::ports::{OptionDefinition, OptionLookup};
use crate::domain::value::split_csv;

static OPTION_CODE_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(,[0-9]+)*$").expect("Invalid option code list regex"));

/// True when `raw` is a list of non-negative integer codes. Whitespace
/// around the commas is ignored.
pub fn is_code_list(raw: &str) -> bool {
    let compact = raw.split(',').map(str::trim).collect::<Vec<_>>().join(",");
    OPTION_CODE_LIST.is_match(&compact)
}

/// Option code lookups
#[derive(Clone)]
pub struct OptionResolver {
    lookup: Arc<dyn OptionLookup>,
    caches: Arc<ResolverCaches>,
}

impl OptionResolver {
    pub fn new(lookup: Arc<dyn OptionLookup>, caches: Arc<ResolverCaches>) -> Self {
        Self { lookup, caches }
    }

    /// Display string for `code`; non-integer input is returned as is
    #[instrument(skip(self), level = "debug")]
    pub fn resolve_option(&self, code: &str) -> String {
        match code.trim().parse::<i64>() {
            Ok(parsed) => self
                .resolve_code(parsed)
                .unwrap_or_else(|| code.to_string()),
            Err(_) => code.to_string(),
        }
    }

    /// Display strings for a comma separated value.
    ///
    /// A list of integer codes resolves code by code, in order. Any other
    /// list is returned as its trimmed parts.
    #[instrument(skip(self), level = "debug")]
    pub fn resolve_option_list(&self, raw: &str) -> Vec<String> {
        let parts = split_csv(raw);
        if parts.is_empty() || !is_code_list(raw) {
            return parts;
        }
        parts.iter().map(|part| self.resolve_option(part)).collect()
    }

    /// Resolve one integer code, `None` when the lookup failed
    pub fn resolve_code(&self, code: i64) -> Option<String> {
        if let Some(display) = self.caches.option(code) {
            return Some(display);
        }

        match self.lookup.display_string(code) {
            Ok(text) => {
                debug!(code, text = %text, "Option resolved");
                self.caches.store_option(code, text.clone());
                Some(text)
            }
            Err(e) => {
                self.caches.counters().record_swallowed_fault();
                if e.is_spurious_lookup_fault() {
                    warn!(code, error = %e, "Spurious option lookup fault, returning code unresolved");
                } else {
                    warn!(code, error = %e, "Option lookup failed, returning code unresolved");
                }
                None
            }
        }
    }

    // =========================================================================
    // Option Types
    // =========================================================================

    /// Id of the option type named `type_name` (case-insensitive).
    ///
    /// Definitions are loaded once; a failed load is retried on the next call.
    pub fn option_type_id(&self, type_name: &str) -> Option<i64> {
        let definitions = self.definitions()?;
        let wanted = type_name.to_lowercase();
        definitions
            .iter()
            .find(|definition| definition.name.to_lowercase() == wanted)
            .map(|definition| definition.id)
    }

    /// Display strings of every option of the named type
    pub fn option_values_for_type(&self, type_name: &str) -> Vec<String> {
        if let Some(values) = self.caches.option_type_values(type_name) {
            return values;
        }

        let Some(id) = self.option_type_id(type_name) else {
            debug!(type_name, "Unknown option type");
            return Vec::new();
        };

        match self.lookup.values_for_definition(id) {
            Ok(values) => {
                self.caches.store_option_type_values(type_name, values.clone());
                values
            }
            Err(e) => {
                self.caches.counters().record_swallowed_fault();
                warn!(type_name, id, error = %e, "Option values unavailable");
                Vec::new()
            }
        }
    }

    fn definitions(&self) -> Option<Arc<Vec<OptionDefinition>>> {
        if let Some(definitions) = self.caches.option_definitions() {
            return Some(definitions);
        }
        match self.lookup.definitions() {
            Ok(definitions) => {
                debug!(count = definitions.len(), "Option definitions loaded");
                Some(self.caches.store_option_definitions(definitions))
            }
            Err(e) => {
                self.caches.counters().record_swallowed_fault();
                warn!(error = %e, "Option definitions unavailable");
                None
            }
        }
    }
}

impl std::fmt::Debug for OptionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionResolver")
            .field("caches", &self.caches)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
