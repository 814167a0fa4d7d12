//! Domain Ports (Port/Adapter Pattern)
//!
//! This module defines the abstractions (ports) that the resolvers depend
//! on. The content tree, configuration, option catalog, and locale source
//! all live outside this crate; adapters implement these traits to provide
//! concrete implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Resolver Layer                          │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    Ports (Traits)                    │    │
//! │  │ ContentTree │ ConfigSource │ OptionLookup │ Locale  │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                  Adapters (Impls)                    │    │
//! │  │ InMemoryContentTree │ StaticConfigSource │ ...      │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All ports are synchronous: resolution is bounded by tree depth, not by
//! network latency, and callers impose their own timeouts.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Raw, untyped property value as stored on a node.
pub type RawValue = serde_json::Value;

// =============================================================================
// Value Objects
// =============================================================================

/// Node identifier (value object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl NodeId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Language code such as `es` or `es-MX` (value object).
///
/// Normalisation lives in [`crate::locale`]; this type only carries the code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for a five character `xx-YY` code.
    pub fn is_regional(&self) -> bool {
        self.0.len() == 5
    }

    /// The two letter language part of a regional code, if any.
    pub fn primary(&self) -> Option<&str> {
        if self.is_regional() {
            self.0.get(..2)
        } else {
            None
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LanguageCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A named option type (data type) and its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub name: String,
    pub id: i64,
}

// =============================================================================
// Content Tree Port
// =============================================================================

/// Port for reading the content tree.
///
/// The resolvers never own node lifetime; every call is a read. Missing
/// nodes answer with `None` / empty collections.
///
/// # Example
///
/// ```ignore
/// struct CmsTree { /* ... */ }
///
/// impl ContentTree for CmsTree {
///     fn parent(&self, id: NodeId) -> Option<NodeId> {
///         // Ask the CMS for the parent
///     }
///     // ...
/// }
/// ```
pub trait ContentTree: Send + Sync {
    /// Check whether a node exists.
    fn exists(&self, id: NodeId) -> bool;

    /// Get the parent of a node.
    fn parent(&self, id: NodeId) -> Option<NodeId>;

    /// Get the ordered children of a node.
    fn children(&self, id: NodeId) -> Vec<NodeId>;

    /// Iterate all descendants of a node in pre-order.
    fn descendants(&self, id: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_>;

    /// Get the type tag (document type alias) of a node.
    fn type_tag(&self, id: NodeId) -> Option<String>;

    /// Get the display name of a node.
    fn name(&self, id: NodeId) -> Option<String>;

    /// Get a raw property value.
    fn raw_property(&self, id: NodeId, alias: &str) -> Option<RawValue>;
}

/// Pull-based pre-order iterator over descendants.
///
/// Holds an explicit stack instead of recursing; the sequence is finite
/// because tree depth is.
pub struct Descendants<'a, T: ContentTree + ?Sized> {
    tree: &'a T,
    stack: Vec<NodeId>,
}

impl<'a, T: ContentTree + ?Sized> Descendants<'a, T> {
    /// Start iterating below `root` (the root itself is not yielded).
    pub fn new(tree: &'a T, root: NodeId) -> Self {
        let mut stack = tree.children(root);
        stack.reverse();
        Self { tree, stack }
    }
}

impl<T: ContentTree + ?Sized> Iterator for Descendants<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        let mut children = self.tree.children(next);
        children.reverse();
        self.stack.extend(children);
        Some(next)
    }
}

// =============================================================================
// Configuration Port
// =============================================================================

/// Port for process-wide configuration (feature flags, default language).
///
/// Reads may fail; resolvers treat a failed read as an absent value.
pub trait ConfigSource: Send + Sync {
    /// Read a boolean flag. Absent keys are `false`.
    fn get_bool(&self, key: &str) -> Result<bool>;

    /// Read a string value.
    fn get_string(&self, key: &str) -> Result<Option<String>>;
}

// =============================================================================
// Option Lookup Port
// =============================================================================

/// Port for resolving option (prevalue) codes to display strings.
///
/// Implementations are known to intermittently fail with a spurious
/// "no matching element" error for valid codes.
pub trait OptionLookup: Send + Sync {
    /// Get the display string for an option code.
    fn display_string(&self, code: i64) -> Result<String>;

    /// List all option definitions (name, id).
    fn definitions(&self) -> Result<Vec<OptionDefinition>>;

    /// List the display strings of all options of a definition.
    fn values_for_definition(&self, definition_id: i64) -> Result<Vec<String>>;
}

// =============================================================================
// Locale Port
// =============================================================================

/// Port for locale inputs: the current request hint and the configured
/// language list.
pub trait LocaleSource: Send + Sync {
    /// Language hint of the current request, if any.
    fn request_language_hint(&self) -> Option<String>;

    /// Configured languages (culture aliases), in priority order.
    fn configured_languages(&self) -> Vec<String>;
}

// =============================================================================
// Tests
// =============================================================================
