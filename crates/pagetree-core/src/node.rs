#![forbid(unsafe_code)]

//! Node identity and nested-set position.
//!
//! A [`TreeNode`] carries the `(tree_id, level, lft, rght)` quadruple that
//! encodes its place in a forest of nested-set trees. Ancestry is derived
//! purely from interval containment: `b` is a descendant of `a` iff both
//! live in the same tree and `a.lft < b.lft && b.rght < a.rght`.
//!
//! # Invariants
//!
//! 1. `lft < rght` for every node accepted into a [`NodeSet`](crate::NodeSet).
//! 2. Sibling intervals never overlap.
//! 3. A node's interval strictly contains the intervals of all its
//!    descendants and no others.
//!
//! Stored intervals are never mutated here; the persistence collaborator owns
//! them and hands out fresh snapshots after every committed change.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a node ID from a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminator separating independent trees that share one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(u64);

impl TreeId {
    /// Create a tree ID from a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity and nested-set position of one content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Unique node identifier.
    pub id: NodeId,
    /// Tree this node belongs to.
    pub tree_id: TreeId,
    /// Depth from the root of its tree.
    pub level: u32,
    /// Left bound of the node's interval.
    pub lft: u64,
    /// Right bound of the node's interval.
    pub rght: u64,
}

impl TreeNode {
    /// Create a node from raw parts.
    #[must_use]
    pub const fn new(id: u64, tree_id: u64, level: u32, lft: u64, rght: u64) -> Self {
        Self {
            id: NodeId::new(id),
            tree_id: TreeId::new(tree_id),
            level,
            lft,
            rght,
        }
    }

    /// Whether `self` lies strictly inside `ancestor`'s interval.
    ///
    /// Both bounds are compared strictly, so a node is never its own
    /// descendant and equal intervals are not containment.
    #[inline]
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &TreeNode) -> bool {
        self.tree_id == ancestor.tree_id && self.lft > ancestor.lft && self.rght < ancestor.rght
    }

    /// Whether `self` strictly contains `other`.
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &TreeNode) -> bool {
        other.is_descendant_of(self)
    }

    /// Whether `lft` falls strictly inside this node's interval.
    #[inline]
    #[must_use]
    pub fn contains(&self, tree_id: TreeId, lft: u64) -> bool {
        self.tree_id == tree_id && self.lft < lft && lft < self.rght
    }

    /// Number of descendants encoded by the interval width.
    #[inline]
    #[must_use]
    pub fn descendant_count(&self) -> u64 {
        self.rght.saturating_sub(self.lft).saturating_sub(1) / 2
    }

    /// Whether the interval leaves room for at least one descendant.
    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.descendant_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_strict() {
        let root = TreeNode::new(1, 1, 0, 1, 10);
        let child = TreeNode::new(2, 1, 1, 2, 5);
        assert!(child.is_descendant_of(&root));
        assert!(root.is_ancestor_of(&child));
        assert!(!root.is_descendant_of(&root));

        let twin = TreeNode::new(3, 1, 0, 1, 10);
        assert!(!twin.is_descendant_of(&root));
    }

    #[test]
    fn other_tree_is_never_contained() {
        let root = TreeNode::new(1, 1, 0, 1, 10);
        let foreign = TreeNode::new(2, 2, 1, 2, 5);
        assert!(!foreign.is_descendant_of(&root));
        assert!(!root.contains(TreeId::new(2), 3));
    }

    #[test]
    fn descendant_count_from_width() {
        assert_eq!(TreeNode::new(1, 1, 0, 1, 10).descendant_count(), 4);
        assert_eq!(TreeNode::new(2, 1, 1, 3, 4).descendant_count(), 0);
        assert!(!TreeNode::new(2, 1, 1, 3, 4).has_children());
    }

    #[test]
    fn serializes_camel_case() {
        let node = TreeNode::new(7, 2, 1, 3, 4);
        let json = serde_json::to_string(&node).expect("serialize node");
        assert_eq!(json, r#"{"id":7,"treeId":2,"level":1,"lft":3,"rght":4}"#);
    }
}
