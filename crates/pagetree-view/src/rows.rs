#![forbid(unsafe_code)]

//! Flattened, render-ready rows of the visible forest.
//!
//! One pass per tree in display order: a collapsed node hides every node
//! whose `lft` falls before its `rght`, which is exactly its subtree.

use pagetree_core::{NodeId, NodeSet, TreeId};

use crate::visibility::{NodeVisibility, VisibilityProjection};

/// One rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRow {
    pub id: NodeId,
    pub tree_id: TreeId,
    /// Depth below the top level of the row's tree.
    pub depth: u32,
    pub state: NodeVisibility,
    /// Whether a toggle control applies to this row.
    pub has_children: bool,
    pub descendant_count: usize,
}

impl VisibilityProjection {
    /// Ids of every rendered node, in display order.
    #[must_use]
    pub fn visible_nodes(&self, nodes: &NodeSet) -> Vec<NodeId> {
        nodes
            .tree_ids()
            .flat_map(|tree_id| self.rendered_in(nodes, nodes.tree(tree_id)))
            .collect()
    }

    /// Rendered rows with the data a row renderer needs.
    #[must_use]
    pub fn visible_rows(&self, nodes: &NodeSet) -> Vec<VisibleRow> {
        self.visible_nodes(nodes)
            .into_iter()
            .filter_map(|id| {
                let node = nodes.get(id)?;
                let descendant_count = nodes.descendant_count(id).unwrap_or(0);
                Some(VisibleRow {
                    id,
                    tree_id: node.tree_id,
                    depth: nodes.depth(node),
                    state: self.current(nodes, node),
                    has_children: descendant_count > 0,
                    descendant_count,
                })
            })
            .collect()
    }
}
