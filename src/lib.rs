//! Arborist - Hierarchical Settings and Localized Content Resolution
//!
//! Resolves settings, translations, option codes and titles over a content
//! tree reached through ports, with TTL caching so that repeat lookups do
//! not touch the tree.
//!
//! # Architecture
//!
//! ```text
//! ContentResolver ──▶ SettingsResolver ──▶ TranslationResolver ──▶ ContentTree
//!        │                                        │
//!        ├──▶ OptionResolver ──▶ OptionLookup     └──▶ LocaleSelector ──▶ LocaleSource
//!        │                                                    └──────▶ ConfigSource
//!        └──▶ ResolverCaches (shared, clock driven)
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - In-memory and environment implementations of the ports
//! - [`cache`] - TTL caches, clocks and cache counters
//! - [`config`] - Resolver constants and configuration keys
//! - [`domain`] - Ports and raw-to-typed property conversion
//! - [`error`] - Error types
//! - [`locale`] - Request language selection
//! - [`navigation`] - Type-aware tree walks
//! - [`options`] - Option code resolution
//! - [`resolver`] - Composition root and higher level helpers
//! - [`settings`] - Hierarchical settings resolution
//! - [`translation`] - Localized property resolution

pub mod adapters;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod locale;
pub mod navigation;
pub mod options;
pub mod resolver;
pub mod settings;
pub mod translation;

// Re-export commonly used types
pub use cache::{CacheStats, Clock, ManualClock, ResolverCaches, SystemClock};
pub use config::{ConfigKeys, ResolverConfig};
pub use domain::{
    ConfigSource, ContentTree, LanguageCode, LocaleSource, NodeId, OptionLookup, PropertyValue,
    RawValue,
};
pub use error::{Error, Result};
pub use locale::LocaleSelector;
pub use options::OptionResolver;
pub use resolver::{ContentResolver, ContentResolverBuilder};
pub use settings::SettingsResolver;
pub use translation::TranslationResolver;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
