//! In-Memory Option Catalog Adapter
//!
//! Implements the `OptionLookup` port from a catalog of option types.
//! Spurious "no matching element" faults can be injected per code to
//! reproduce the intermittent failure of real option stores.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{OptionDefinition, OptionLookup};
use crate::error::{Error, Result};

/// Reason text of the known intermittent fault
pub const SPURIOUS_FAULT_REASON: &str = "Sequence contains no matching element";

/// An option type as written in a catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionTypeDocument {
    pub name: String,
    pub id: i64,
    #[serde(default)]
    pub options: BTreeMap<i64, String>,
}

/// A whole catalog document
///
/// ```yaml
/// types:
///   - name: Colours
///     id: 10
///     options:
///       3: Red
///       7: Green
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionCatalogDocument {
    #[serde(default)]
    pub types: Vec<OptionTypeDocument>,
}

#[derive(Debug, Default)]
struct CatalogState {
    display: HashMap<i64, String>,
    types: Vec<OptionTypeDocument>,
}

/// Option catalog held in memory
#[derive(Debug, Default)]
pub struct InMemoryOptionCatalog {
    state: RwLock<CatalogState>,
    pending_faults: Mutex<HashMap<i64, u32>>,
    definitions_unavailable: Mutex<u32>,
    display_calls: AtomicU64,
    definition_calls: AtomicU64,
}

impl InMemoryOptionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: OptionCatalogDocument) -> Self {
        let catalog = Self::new();
        for option_type in document.types {
            catalog.add_type(option_type);
        }
        catalog
    }

    /// Parse a YAML (or JSON) catalog
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(Self::from_document(serde_yaml::from_str(text)?))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    /// Register an option type and its options
    pub fn add_type(&self, option_type: OptionTypeDocument) {
        let mut state = self.state.write();
        for (code, display) in &option_type.options {
            state.display.insert(*code, display.clone());
        }
        state.types.push(option_type);
    }

    /// Register a single option outside any type
    pub fn insert(&self, code: i64, display: impl Into<String>) {
        self.state.write().display.insert(code, display.into());
    }

    /// Fail the next `times` lookups of `code` with the spurious fault
    pub fn inject_spurious_faults(&self, code: i64, times: u32) {
        *self.pending_faults.lock().entry(code).or_insert(0) += times;
    }

    /// Fail the next `times` definition listings
    pub fn fail_definitions(&self, times: u32) {
        *self.definitions_unavailable.lock() += times;
    }

    /// Number of `display_string` calls made so far
    pub fn display_calls(&self) -> u64 {
        self.display_calls.load(Ordering::Relaxed)
    }

    /// Number of `definitions` calls made so far
    pub fn definition_calls(&self) -> u64 {
        self.definition_calls.load(Ordering::Relaxed)
    }

    fn take_fault(&self, code: i64) -> bool {
        let mut faults = self.pending_faults.lock();
        match faults.get_mut(&code) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl OptionLookup for InMemoryOptionCatalog {
    fn display_string(&self, code: i64) -> Result<String> {
        self.display_calls.fetch_add(1, Ordering::Relaxed);
        if self.take_fault(code) {
            return Err(Error::OptionLookup {
                code,
                reason: SPURIOUS_FAULT_REASON.to_string(),
            });
        }
        self.state
            .read()
            .display
            .get(&code)
            .cloned()
            .ok_or_else(|| Error::OptionLookup {
                code,
                reason: "unknown option code".to_string(),
            })
    }

    fn definitions(&self) -> Result<Vec<OptionDefinition>> {
        self.definition_calls.fetch_add(1, Ordering::Relaxed);
        {
            let mut unavailable = self.definitions_unavailable.lock();
            if *unavailable > 0 {
                *unavailable -= 1;
                return Err(Error::OptionDefinitions("catalog unavailable".to_string()));
            }
        }
        Ok(self
            .state
            .read()
            .types
            .iter()
            .map(|t| OptionDefinition {
                name: t.name.clone(),
                id: t.id,
            })
            .collect())
    }

    fn values_for_definition(&self, definition_id: i64) -> Result<Vec<String>> {
        Ok(self
            .state
            .read()
            .types
            .iter()
            .find(|t| t.id == definition_id)
            .map(|t| t.options.values().cloned().collect())
            .unwrap_or_default())
    }
}

// =============================================================================
// Tests
// =============================================================================
