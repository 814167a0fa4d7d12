//! Domain Layer
//!
//! The resolvers depend only on this layer:
//!
//! - **Ports** (`ports.rs`) - Trait abstractions for the content tree,
//!   configuration, option catalog, and locale source
//! - **Values** (`value.rs`) - Raw-to-typed property conversion
//!
//! # Usage
//!
//! ```ignore
//! use arborist::domain::ports::{ContentTree, NodeId};
//! use arborist::domain::value::read_property;
//!
//! fn page_size(tree: &dyn ContentTree, page: NodeId) -> i64 {
//!     read_property::<i64, _>(tree, page, "pageSize")
//! }
//! ```

pub mod ports;
pub mod value;

// Re-export commonly used types
pub use ports::{
    ConfigSource, ContentTree, Descendants, LanguageCode, LocaleSource, NodeId, OptionDefinition,
    OptionLookup, RawValue,
};
pub use value::{PropertyValue, Typed};
