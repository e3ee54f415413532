#![forbid(unsafe_code)]

//! Interval queries over nested-set nodes.
//!
//! Every function here is pure and accepts any iterable of `&TreeNode`; no
//! ordering of the input is assumed. Each query is a single linear scan, so
//! the cost is O(nodes supplied). Callers that want O(nodes in one tree)
//! pass [`NodeSet::tree`](crate::NodeSet::tree) instead of the whole forest.
//!
//! # Invariants
//!
//! 1. `is_descendant_of(a, a)` is false.
//! 2. `is_descendant_of(a, b) && is_descendant_of(b, a)` is never true.
//! 3. Nodes of different trees are never related.

use std::cmp::Ordering;

use crate::node::TreeNode;

/// True iff `candidate` lies strictly inside `ancestor` in the same tree.
#[inline]
#[must_use]
pub fn is_descendant_of(candidate: &TreeNode, ancestor: &TreeNode) -> bool {
    candidate.is_descendant_of(ancestor)
}

/// True iff `a` strictly contains `b`.
#[inline]
#[must_use]
pub fn is_ancestor_of(a: &TreeNode, b: &TreeNode) -> bool {
    is_descendant_of(b, a)
}

/// Descendants of `node` exactly one level deeper.
pub fn immediate_children_of<'a, I>(node: &TreeNode, nodes: I) -> Vec<&'a TreeNode>
where
    I: IntoIterator<Item = &'a TreeNode>,
{
    let Some(child_level) = node.level.checked_add(1) else {
        return Vec::new();
    };
    nodes
        .into_iter()
        .filter(|n| n.level == child_level && n.is_descendant_of(node))
        .collect()
}

/// Nodes sharing `node`'s tree whose `lft` lies strictly between the bounds.
///
/// Passing `node.lft` and `node.rght` selects the node's subtree without
/// touching unrelated trees.
pub fn siblings_in_range<'a, I>(
    node: &TreeNode,
    lower: u64,
    upper: u64,
    nodes: I,
) -> Vec<&'a TreeNode>
where
    I: IntoIterator<Item = &'a TreeNode>,
{
    nodes
        .into_iter()
        .filter(|n| n.tree_id == node.tree_id && lower < n.lft && n.lft < upper)
        .collect()
}

/// Every transitive descendant of `node`.
pub fn descendants_of<'a, I>(node: &TreeNode, nodes: I) -> Vec<&'a TreeNode>
where
    I: IntoIterator<Item = &'a TreeNode>,
{
    siblings_in_range(node, node.lft, node.rght, nodes)
}

/// Every strict ancestor of `node`, root first.
pub fn ancestors_of<'a, I>(node: &TreeNode, nodes: I) -> Vec<&'a TreeNode>
where
    I: IntoIterator<Item = &'a TreeNode>,
{
    let mut out: Vec<&TreeNode> = nodes
        .into_iter()
        .filter(|n| node.is_descendant_of(n))
        .collect();
    out.sort_by_key(|n| n.lft);
    out
}

/// Number of descendants implied by the interval width.
#[inline]
#[must_use]
pub fn descendant_count(node: &TreeNode) -> u64 {
    node.descendant_count()
}

/// Display ordering: by tree, then by left bound (pre-order).
#[must_use]
pub fn display_order(a: &TreeNode, b: &TreeNode) -> Ordering {
    a.tree_id.cmp(&b.tree_id).then(a.lft.cmp(&b.lft))
}
