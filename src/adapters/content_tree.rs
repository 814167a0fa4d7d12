//! In-Memory Content Tree Adapter
//!
//! Implements the `ContentTree` port over a tree loaded from a YAML or JSON
//! document. Every port call is counted so callers can observe how much
//! tree work a resolution did.
//!
//! # Document format
//!
//! ```yaml
//! roots:
//!   - id: 1
//!     type: Home
//!     name: Home
//!     properties:
//!       title: Welcome
//!     children:
//!       - id: 2
//!         type: Settings
//!         name: Settings
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{ContentTree, Descendants, NodeId, RawValue};
use crate::error::{Error, Result};

// =============================================================================
// Document Types
// =============================================================================

/// A node as written in a tree document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub type_tag: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, RawValue>,
    #[serde(default)]
    pub children: Vec<NodeDocument>,
}

/// A whole tree document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default)]
    pub roots: Vec<NodeDocument>,
}

// =============================================================================
// Access Counters
// =============================================================================

/// Snapshot of tree port calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeAccessStats {
    pub parent_calls: u64,
    pub children_calls: u64,
    pub descendants_calls: u64,
    pub property_reads: u64,
}

impl TreeAccessStats {
    /// Calls that scan the tree (children lists and descendant walks)
    pub fn scans(&self) -> u64 {
        self.children_calls + self.descendants_calls
    }

    /// Every counted call
    pub fn total(&self) -> u64 {
        self.parent_calls + self.children_calls + self.descendants_calls + self.property_reads
    }
}

#[derive(Debug, Default)]
struct AccessCounters {
    parent_calls: AtomicU64,
    children_calls: AtomicU64,
    descendants_calls: AtomicU64,
    property_reads: AtomicU64,
}

impl AccessCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> TreeAccessStats {
        TreeAccessStats {
            parent_calls: self.parent_calls.load(Ordering::Relaxed),
            children_calls: self.children_calls.load(Ordering::Relaxed),
            descendants_calls: self.descendants_calls.load(Ordering::Relaxed),
            property_reads: self.property_reads.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.parent_calls.store(0, Ordering::Relaxed);
        self.children_calls.store(0, Ordering::Relaxed);
        self.descendants_calls.store(0, Ordering::Relaxed);
        self.property_reads.store(0, Ordering::Relaxed);
    }
}

// =============================================================================
// In-Memory Tree
// =============================================================================

#[derive(Debug, Clone)]
struct StoredNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    type_tag: String,
    name: String,
    properties: HashMap<String, RawValue>,
}

#[derive(Debug, Default)]
struct TreeState {
    nodes: HashMap<NodeId, StoredNode>,
    roots: Vec<NodeId>,
}

/// Content tree held in memory.
///
/// Mutations are allowed so tests can edit content between resolutions;
/// the resolvers only ever read.
#[derive(Debug, Default)]
pub struct InMemoryContentTree {
    state: RwLock<TreeState>,
    counters: AccessCounters,
}

impl InMemoryContentTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a parsed document
    pub fn from_document(document: &TreeDocument) -> Result<Self> {
        let tree = Self::new();
        {
            let mut state = tree.state.write();
            for root in &document.roots {
                Self::insert_document(&mut state, None, root)?;
            }
        }
        debug!(nodes = tree.len(), "Loaded content tree");
        Ok(tree)
    }

    /// Parse a YAML document (JSON is accepted too)
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let document: TreeDocument = serde_yaml::from_str(text)?;
        Self::from_document(&document)
    }

    /// Parse a JSON document
    pub fn from_json_str(text: &str) -> Result<Self> {
        let document: TreeDocument = serde_json::from_str(text)?;
        Self::from_document(&document)
    }

    /// Load a document from disk; `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&text),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::from_yaml_str(&text)
            }
            Some(ext) => Err(Error::TreeDocument(format!(
                "unsupported tree document extension '.{}'",
                ext
            ))),
            None => Self::from_yaml_str(&text),
        }
    }

    fn insert_document(state: &mut TreeState, parent: Option<NodeId>, doc: &NodeDocument) -> Result<()> {
        let id = NodeId(doc.id);
        Self::attach(
            state,
            parent,
            id,
            StoredNode {
                parent,
                children: Vec::new(),
                type_tag: doc.type_tag.clone(),
                name: doc.name.clone(),
                properties: doc.properties.clone().into_iter().collect(),
            },
        )?;
        for child in &doc.children {
            Self::insert_document(state, Some(id), child)?;
        }
        Ok(())
    }

    fn attach(state: &mut TreeState, parent: Option<NodeId>, id: NodeId, node: StoredNode) -> Result<()> {
        if state.nodes.contains_key(&id) {
            return Err(Error::InvalidTreeDocument {
                reason: format!("duplicate node id {}", id),
            });
        }
        match parent {
            Some(parent_id) => state
                .nodes
                .get_mut(&parent_id)
                .ok_or(Error::NodeNotFound(parent_id))?
                .children
                .push(id),
            None => state.roots.push(id),
        }
        state.nodes.insert(id, node);
        Ok(())
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Add a node as the last child of `parent` (or as a new root)
    pub fn add_node(
        &self,
        parent: Option<NodeId>,
        id: NodeId,
        type_tag: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<()> {
        let node = StoredNode {
            parent,
            children: Vec::new(),
            type_tag: type_tag.into(),
            name: name.into(),
            properties: HashMap::new(),
        };
        Self::attach(&mut self.state.write(), parent, id, node)
    }

    /// Set or replace a property value
    pub fn set_property(&self, id: NodeId, alias: impl Into<String>, value: RawValue) -> Result<()> {
        let mut state = self.state.write();
        let node = state.nodes.get_mut(&id).ok_or(Error::NodeNotFound(id))?;
        node.properties.insert(alias.into(), value);
        Ok(())
    }

    /// Remove a node and its whole subtree
    pub fn remove_node(&self, id: NodeId) -> Result<()> {
        let mut state = self.state.write();
        let parent = state.nodes.get(&id).ok_or(Error::NodeNotFound(id))?.parent;
        match parent {
            Some(parent_id) => {
                if let Some(parent) = state.nodes.get_mut(&parent_id) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => state.roots.retain(|root| *root != id),
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(removed) = state.nodes.remove(&next) {
                pending.extend(removed.children);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Root node ids in document order
    pub fn roots(&self) -> Vec<NodeId> {
        self.state.read().roots.clone()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Port calls made so far
    pub fn access_stats(&self) -> TreeAccessStats {
        self.counters.snapshot()
    }

    pub fn reset_access_stats(&self) {
        self.counters.reset();
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.state
            .read()
            .nodes
            .get(&id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }
}

/// Walks without touching the call counters, so one descendant scan
/// counts as one call.
struct UncountedChildren<'a>(&'a InMemoryContentTree);

impl ContentTree for UncountedChildren<'_> {
    fn exists(&self, id: NodeId) -> bool {
        self.0.state.read().nodes.contains_key(&id)
    }

    fn parent(&self, _id: NodeId) -> Option<NodeId> {
        None
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.0.children_of(id)
    }

    fn descendants(&self, id: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_> {
        Box::new(Descendants::new(self, id))
    }

    fn type_tag(&self, _id: NodeId) -> Option<String> {
        None
    }

    fn name(&self, _id: NodeId) -> Option<String> {
        None
    }

    fn raw_property(&self, _id: NodeId, _alias: &str) -> Option<RawValue> {
        None
    }
}

impl ContentTree for InMemoryContentTree {
    fn exists(&self, id: NodeId) -> bool {
        self.state.read().nodes.contains_key(&id)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        AccessCounters::bump(&self.counters.parent_calls);
        self.state.read().nodes.get(&id).and_then(|node| node.parent)
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        AccessCounters::bump(&self.counters.children_calls);
        self.children_of(id)
    }

    fn descendants(&self, id: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_> {
        AccessCounters::bump(&self.counters.descendants_calls);
        // Materialised up front so no read guard outlives this call
        let ids: Vec<NodeId> = Descendants::new(&UncountedChildren(self), id).collect();
        Box::new(ids.into_iter())
    }

    fn type_tag(&self, id: NodeId) -> Option<String> {
        self.state.read().nodes.get(&id).map(|node| node.type_tag.clone())
    }

    fn name(&self, id: NodeId) -> Option<String> {
        self.state.read().nodes.get(&id).map(|node| node.name.clone())
    }

    fn raw_property(&self, id: NodeId, alias: &str) -> Option<RawValue> {
        AccessCounters::bump(&self.counters.property_reads);
        self.state
            .read()
            .nodes
            .get(&id)
            .and_then(|node| node.properties.get(alias).cloned())
    }
}

// =============================================================================
// Tests
// =============================================================================
