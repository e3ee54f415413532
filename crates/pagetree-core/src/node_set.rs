#![forbid(unsafe_code)]

//! Validated, read-only snapshot of a node forest.
//!
//! [`NodeSet`] is what the persistence collaborator hands over at the start
//! of each interaction. It is checked once on construction and then only
//! queried, never mutated; a committed change produces a new snapshot.
//!
//! Nodes are stored in display order (`tree_id`, then `lft`), so each tree is
//! a contiguous slice and every subtree is a contiguous run directly after
//! its root.

use std::ops::Range;

use ahash::AHashMap;

use crate::error::SnapshotError;
use crate::interval;
use crate::node::{NodeId, TreeId, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TreeSpan {
    tree_id: TreeId,
    start: usize,
    end: usize,
    root_level: u32,
}

/// Immutable, validated node collection keyed by id.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: Vec<TreeNode>,
    index: AHashMap<NodeId, usize>,
    trees: Vec<TreeSpan>,
}

impl NodeSet {
    /// Build a snapshot, validating the nested-set invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: duplicate ids, inverted
    /// intervals, partially overlapping intervals, or levels that disagree
    /// with containment depth.
    pub fn from_nodes(nodes: impl IntoIterator<Item = TreeNode>) -> Result<Self, SnapshotError> {
        let mut nodes: Vec<TreeNode> = nodes.into_iter().collect();

        for node in &nodes {
            if node.lft >= node.rght {
                return Err(SnapshotError::InvertedInterval {
                    id: node.id,
                    lft: node.lft,
                    rght: node.rght,
                });
            }
        }

        nodes.sort_by(interval::display_order);

        let mut index = AHashMap::with_capacity(nodes.len());
        for (pos, node) in nodes.iter().enumerate() {
            if index.insert(node.id, pos).is_some() {
                return Err(SnapshotError::DuplicateId(node.id));
            }
        }

        let mut trees = Vec::new();
        let mut start = 0;
        while start < nodes.len() {
            let tree_id = nodes[start].tree_id;
            let end = start + nodes[start..].partition_point(|n| n.tree_id == tree_id);
            let root_level = validate_tree(&nodes[start..end])?;
            trees.push(TreeSpan {
                tree_id,
                start,
                end,
                root_level,
            });
            start = end;
        }

        Ok(Self {
            nodes,
            index,
            trees,
        })
    }

    /// Parse a JSON array of nodes and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] on malformed input, or any validation
    /// error from [`from_nodes`](Self::from_nodes).
    pub fn from_json_str(s: &str) -> Result<Self, SnapshotError> {
        let nodes: Vec<TreeNode> = serde_json::from_str(s)?;
        Self::from_nodes(nodes)
    }

    /// Number of nodes across all trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.index.get(&id).map(|&pos| &self.nodes[pos])
    }

    /// Whether a node with this id exists.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// All nodes in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, TreeNode> {
        self.nodes.iter()
    }

    /// All nodes in display order, as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Tree identifiers in ascending order.
    pub fn tree_ids(&self) -> impl Iterator<Item = TreeId> + '_ {
        self.trees.iter().map(|span| span.tree_id)
    }

    /// Nodes of one tree, ordered by `lft`. Empty for unknown trees.
    #[must_use]
    pub fn tree(&self, tree_id: TreeId) -> &[TreeNode] {
        self.span(tree_id)
            .map_or(&[][..], |span| &self.nodes[span.start..span.end])
    }

    /// Level shared by the top-level nodes of a tree.
    #[must_use]
    pub fn root_level(&self, tree_id: TreeId) -> Option<u32> {
        self.span(tree_id).map(|span| span.root_level)
    }

    /// Depth of a node below the top level of its tree.
    #[must_use]
    pub fn depth(&self, node: &TreeNode) -> u32 {
        let root = self.root_level(node.tree_id).unwrap_or(node.level);
        node.level.saturating_sub(root)
    }

    /// Top-level nodes of every tree, in display order.
    #[must_use]
    pub fn roots(&self) -> Vec<&TreeNode> {
        self.trees
            .iter()
            .flat_map(|span| {
                self.nodes[span.start..span.end]
                    .iter()
                    .filter(move |n| n.level == span.root_level)
            })
            .collect()
    }

    /// Immediate children of `id`, ordered by `lft`.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<&TreeNode> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        interval::immediate_children_of(node, self.subtree(id))
    }

    /// Every transitive descendant of `id`, in display order.
    ///
    /// The descendants of a node form one contiguous run directly after it.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> &[TreeNode] {
        self.subtree_range(id)
            .map_or(&[][..], |range| &self.nodes[range])
    }

    /// Alias for [`subtree`](Self::subtree) returning owned references.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<&TreeNode> {
        self.subtree(id).iter().collect()
    }

    /// Strict ancestors of `id`, root first (breadcrumb order).
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<&TreeNode> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let pos = self.index[&id];
        let span_start = self.span(node.tree_id).map_or(pos, |span| span.start);
        // Ancestors precede the node in pre-order.
        interval::ancestors_of(node, &self.nodes[span_start..pos])
    }

    /// Number of descendants of `id`, or `None` if unknown.
    #[must_use]
    pub fn descendant_count(&self, id: NodeId) -> Option<usize> {
        self.subtree_range(id).map(|range| range.len())
    }

    fn subtree_range(&self, id: NodeId) -> Option<Range<usize>> {
        let &pos = self.index.get(&id)?;
        let node = &self.nodes[pos];
        let span = self.span(node.tree_id)?;
        let tail = &self.nodes[pos + 1..span.end];
        let len = tail.partition_point(|n| n.lft < node.rght);
        Some(pos + 1..pos + 1 + len)
    }

    fn span(&self, tree_id: TreeId) -> Option<&TreeSpan> {
        self.trees
            .binary_search_by_key(&tree_id, |span| span.tree_id)
            .ok()
            .map(|i| &self.trees[i])
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a TreeNode;
    type IntoIter = std::slice::Iter<'a, TreeNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Check nesting and levels of one tree sorted by `lft`; returns the
/// top-level depth.
fn validate_tree(tree: &[TreeNode]) -> Result<u32, SnapshotError> {
    let mut open: Vec<&TreeNode> = Vec::new();
    let mut root_level: Option<u32> = None;

    for node in tree {
        while open.last().is_some_and(|top| top.rght < node.lft) {
            open.pop();
        }

        match open.last() {
            Some(parent) => {
                if node.lft <= parent.lft || node.rght >= parent.rght {
                    return Err(SnapshotError::OverlappingIntervals {
                        tree_id: node.tree_id,
                        first: parent.id,
                        second: node.id,
                    });
                }
                let Some(expected) = parent.level.checked_add(1) else {
                    return Err(SnapshotError::LevelOverflow {
                        id: parent.id,
                        level: parent.level,
                    });
                };
                if node.level != expected {
                    return Err(SnapshotError::InconsistentLevel {
                        id: node.id,
                        expected,
                        found: node.level,
                    });
                }
            }
            None => match root_level {
                Some(expected) if expected != node.level => {
                    return Err(SnapshotError::InconsistentLevel {
                        id: node.id,
                        expected,
                        found: node.level,
                    });
                }
                Some(_) => {}
                None => root_level = Some(node.level),
            },
        }

        open.push(node);
    }

    Ok(root_level.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NodeSet {
        NodeSet::from_nodes([
            TreeNode::new(4, 1, 1, 6, 9),
            TreeNode::new(1, 1, 0, 1, 10),
            TreeNode::new(3, 1, 2, 3, 4),
            TreeNode::new(2, 1, 1, 2, 5),
            TreeNode::new(5, 1, 2, 7, 8),
            TreeNode::new(9, 2, 1, 1, 2),
        ])
        .expect("valid snapshot")
    }

    fn raw(nodes: &[&TreeNode]) -> Vec<u64> {
        nodes.iter().map(|n| n.id.raw()).collect()
    }

    #[test]
    fn display_order_and_lookup() {
        let set = sample();
        let order: Vec<u64> = set.iter().map(|n| n.id.raw()).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 9]);
        assert_eq!(set.get(NodeId::new(3)).map(|n| n.level), Some(2));
        assert!(!set.contains(NodeId::new(42)));
        assert_eq!(set.tree_ids().count(), 2);
    }

    #[test]
    fn subtree_is_contiguous() {
        let set = sample();
        let sub: Vec<u64> = set
            .subtree(NodeId::new(1))
            .iter()
            .map(|n| n.id.raw())
            .collect();
        assert_eq!(sub, vec![2, 3, 4, 5]);
        assert_eq!(set.descendant_count(NodeId::new(2)), Some(1));
        assert_eq!(set.descendant_count(NodeId::new(3)), Some(0));
        assert_eq!(set.descendant_count(NodeId::new(99)), None);
    }

    #[test]
    fn children_and_ancestors() {
        let set = sample();
        assert_eq!(raw(&set.children(NodeId::new(1))), vec![2, 4]);
        assert_eq!(raw(&set.ancestors(NodeId::new(5))), vec![1, 4]);
        assert!(set.ancestors(NodeId::new(1)).is_empty());
    }

    #[test]
    fn roots_and_depth() {
        let set = sample();
        assert_eq!(raw(&set.roots()), vec![1, 9]);
        // Tree 2 is rooted at level 1.
        assert_eq!(set.root_level(TreeId::new(2)), Some(1));
        let lone = *set.get(NodeId::new(9)).expect("node 9");
        assert_eq!(set.depth(&lone), 0);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = NodeSet::from_nodes([
            TreeNode::new(1, 1, 0, 1, 4),
            TreeNode::new(1, 1, 1, 2, 3),
        ])
        .unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateId(id) if id == NodeId::new(1)));
    }

    #[test]
    fn rejects_inverted_interval() {
        let err = NodeSet::from_nodes([TreeNode::new(1, 1, 0, 5, 5)]).unwrap_err();
        assert!(matches!(err, SnapshotError::InvertedInterval { .. }));
    }

    #[test]
    fn rejects_partial_overlap() {
        let err = NodeSet::from_nodes([
            TreeNode::new(1, 1, 0, 1, 6),
            TreeNode::new(2, 1, 1, 4, 8),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::OverlappingIntervals { first, second, .. }
                if first == NodeId::new(1) && second == NodeId::new(2)
        ));
    }

    #[test]
    fn rejects_shared_bound() {
        let err = NodeSet::from_nodes([
            TreeNode::new(1, 1, 0, 1, 4),
            TreeNode::new(2, 1, 0, 4, 6),
        ])
        .unwrap_err();
        assert!(matches!(err, SnapshotError::OverlappingIntervals { .. }));
    }

    #[test]
    fn rejects_level_gap() {
        let err = NodeSet::from_nodes([
            TreeNode::new(1, 1, 0, 1, 4),
            TreeNode::new(2, 1, 2, 2, 3),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::InconsistentLevel {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn rejects_children_below_max_level() {
        let err = NodeSet::from_nodes([
            TreeNode::new(1, 1, u32::MAX, 1, 4),
            TreeNode::new(2, 1, 0, 2, 3),
        ])
        .unwrap_err();
        assert!(matches!(err, SnapshotError::LevelOverflow { level: u32::MAX, .. }));

        let leaf = NodeSet::from_nodes([TreeNode::new(1, 1, u32::MAX, 1, 2)]);
        assert!(leaf.is_ok(), "a childless node may sit at the max level");
    }

    #[test]
    fn intervals_in_other_trees_do_not_interact() {
        let set = NodeSet::from_nodes([
            TreeNode::new(1, 1, 0, 1, 4),
            TreeNode::new(2, 2, 0, 2, 3),
        ])
        .expect("independent trees");
        assert!(set.subtree(NodeId::new(1)).is_empty());
    }

    #[test]
    fn parses_json_snapshot() {
        let set = NodeSet::from_json_str(
            r#"[{"id":1,"treeId":1,"level":0,"lft":1,"rght":4},
                {"id":2,"treeId":1,"level":1,"lft":2,"rght":3}]"#,
        )
        .expect("json snapshot");
        assert_eq!(set.len(), 2);
        assert!(matches!(
            NodeSet::from_json_str("not json"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn empty_snapshot_is_valid() {
        let set = NodeSet::from_nodes(Vec::new()).expect("empty");
        assert!(set.is_empty());
        assert!(set.roots().is_empty());
        assert!(set.tree(TreeId::new(1)).is_empty());
    }
}
