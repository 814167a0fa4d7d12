//! Infrastructure Adapters
//!
//! This module contains adapter implementations for the domain ports,
//! following the Port/Adapter (Hexagonal) architecture pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                              │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │                    Ports (Traits)                           │ │
//! │  │  ContentTree │ ConfigSource │ OptionLookup │ LocaleSource │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters (This Module)                       │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │ InMemoryContentTree │ StaticConfigSource │ EnvConfigSource │ │
//! │  │ InMemoryOptionCatalog │ StaticLocaleSource │ RequestLocale │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use arborist::adapters::{InMemoryContentTree, StaticLocaleSource};
//! use arborist::domain::ports::ContentTree;
//!
//! let tree = InMemoryContentTree::load("site.yaml")?;
//! let children = tree.children(tree.roots()[0]);
//! ```

mod config_source;
mod content_tree;
mod locale_source;
mod option_catalog;

pub use config_source::{EnvConfigSource, StaticConfigSource, ENV_PREFIX};
pub use content_tree::{InMemoryContentTree, NodeDocument, TreeAccessStats, TreeDocument};
pub use locale_source::{RequestLocaleSource, StaticLocaleSource};
pub use option_catalog::{
    InMemoryOptionCatalog, OptionCatalogDocument, OptionTypeDocument, SPURIOUS_FAULT_REASON,
};
