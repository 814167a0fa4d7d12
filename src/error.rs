//! Error types for Arborist
//!
//! Most of these never reach callers of the resolvers: port failures are
//! logged and degraded to default values. They surface from the adapters
//! (document loading) and from the ports themselves.

use thiserror::Error;

use crate::domain::ports::NodeId;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading content or talking to a port
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // =========================================================================
    // Port Errors
    // =========================================================================
    /// Option display lookup failed (includes the spurious "no matching element" fault)
    #[error("Option lookup failed for code {code}: {reason}")]
    OptionLookup { code: i64, reason: String },

    /// Option definitions could not be listed
    #[error("Option definitions unavailable: {0}")]
    OptionDefinitions(String),

    /// Configuration read raised
    #[error("Configuration unavailable for key '{key}': {reason}")]
    ConfigurationUnavailable { key: String, reason: String },

    /// Node does not exist in the content tree
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    // =========================================================================
    // Document Errors
    // =========================================================================
    /// Unsupported or unreadable tree document
    #[error("Tree document error: {0}")]
    TreeDocument(String),

    /// Tree document is structurally invalid
    #[error("Invalid tree document: {reason}")]
    InvalidTreeDocument { reason: String },
}

impl Error {
    /// True for the known intermittent option lookup fault.
    pub fn is_spurious_lookup_fault(&self) -> bool {
        matches!(self, Error::OptionLookup { reason, .. } if reason.contains("no matching element"))
    }
}
