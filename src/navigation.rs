//! Tree Navigation
//!
//! Type-aware walks over a [`ContentTree`]. Type tags compare
//! case-insensitively and results come back in tree order.

use crate::domain::ports::{ContentTree, NodeId};

fn has_type(tree: &dyn ContentTree, id: NodeId, types: &[&str]) -> bool {
    match tree.type_tag(id) {
        Some(tag) => types.iter().any(|t| t.eq_ignore_ascii_case(&tag)),
        None => false,
    }
}

/// Nearest ancestor with the given type; starts at the parent unless
/// `include_self`
pub fn nearest_ancestor_of_type(
    tree: &dyn ContentTree,
    node: NodeId,
    type_tag: &str,
    include_self: bool,
) -> Option<NodeId> {
    nearest_ancestor_of_types(tree, node, &[type_tag], include_self)
}

/// Nearest ancestor with any of the given types
pub fn nearest_ancestor_of_types(
    tree: &dyn ContentTree,
    node: NodeId,
    types: &[&str],
    include_self: bool,
) -> Option<NodeId> {
    if !tree.exists(node) {
        return None;
    }
    let mut current = if include_self {
        Some(node)
    } else {
        tree.parent(node)
    };
    while let Some(id) = current {
        if has_type(tree, id, types) {
            return Some(id);
        }
        current = tree.parent(id);
    }
    None
}

/// Direct children with any of the given types
pub fn children_of_types(tree: &dyn ContentTree, node: NodeId, types: &[&str]) -> Vec<NodeId> {
    if types.is_empty() {
        return Vec::new();
    }
    tree.children(node)
        .into_iter()
        .filter(|child| has_type(tree, *child, types))
        .collect()
}

/// All descendants with any of the given types, pre-order
pub fn descendants_of_types(tree: &dyn ContentTree, node: NodeId, types: &[&str]) -> Vec<NodeId> {
    if types.is_empty() {
        return Vec::new();
    }
    tree.descendants(node)
        .filter(|id| has_type(tree, *id, types))
        .collect()
}

/// Siblings with any of the given types, excluding `node`
pub fn siblings_of_types(tree: &dyn ContentTree, node: NodeId, types: &[&str]) -> Vec<NodeId> {
    match tree.parent(node) {
        Some(parent) => tree
            .children(parent)
            .into_iter()
            .filter(|id| *id != node && has_type(tree, *id, types))
            .collect(),
        None => Vec::new(),
    }
}

/// Siblings with any of the given types, plus `node` in its own position
pub fn siblings_and_self(tree: &dyn ContentTree, node: NodeId, types: &[&str]) -> Vec<NodeId> {
    match tree.parent(node) {
        Some(parent) => tree
            .children(parent)
            .into_iter()
            .filter(|id| *id == node || has_type(tree, *id, types))
            .collect(),
        None if tree.exists(node) => vec![node],
        None => Vec::new(),
    }
}

/// The top-most ancestor (the node itself at the root)
pub fn root_ancestor(tree: &dyn ContentTree, node: NodeId) -> NodeId {
    let mut root = node;
    while let Some(parent) = tree.parent(root) {
        root = parent;
    }
    root
}

/// Follow `path`, taking the first child of each type in turn.
///
/// An empty path returns `node` itself.
pub fn child_by_type_path(tree: &dyn ContentTree, node: NodeId, path: &[&str]) -> Option<NodeId> {
    if !tree.exists(node) {
        return None;
    }
    let mut current = node;
    for &type_tag in path {
        current = tree
            .children(current)
            .into_iter()
            .find(|child| has_type(tree, *child, &[type_tag]))?;
    }
    Some(current)
}

/// Follow `path`, keeping every child of each type at each step
pub fn children_by_type_path(tree: &dyn ContentTree, node: NodeId, path: &[&str]) -> Vec<NodeId> {
    if !tree.exists(node) {
        return Vec::new();
    }
    let mut level = vec![node];
    for &type_tag in path {
        level = level
            .into_iter()
            .flat_map(|id| tree.children(id))
            .filter(|child| has_type(tree, *child, &[type_tag]))
            .collect();
        if level.is_empty() {
            break;
        }
    }
    level
}
