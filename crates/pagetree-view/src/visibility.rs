#![forbid(unsafe_code)]

//! Expanded/collapsed projection of a node forest.
//!
//! [`VisibilityProjection`] owns the [`VisibilityState`] map and is the only
//! code path that mutates it. A node is rendered iff every strict ancestor
//! in its tree is [`NodeVisibility::Expanded`]; rendering is derived from
//! the map, never stored.
//!
//! # Toggle semantics
//!
//! - **Collapse** closes the node and force-closes every open descendant, so
//!   a later expand starts from a fully collapsed subtree.
//! - **Expand** opens the node and reveals only its immediate children.
//!   Deeper descendants stay closed until toggled themselves.
//! - A leaf still flips state; nothing is shown or hidden.
//!
//! Each toggle returns the ids whose rendered visibility changed, so callers
//! can patch the display instead of redrawing the forest.
//!
//! # Invariants
//!
//! 1. Toggling twice restores the same set of rendered immediate children.
//! 2. After any toggle, no open node sits under a collapsed node inside the
//!    toggled subtree.
//! 3. Toggling a hidden node flips its state but changes no rendered row.

use ahash::{AHashMap, AHashSet};
use pagetree_core::{NodeId, NodeSet, TreeId, TreeNode};
use serde::{Deserialize, Serialize};
use tracing::field::Empty;
use web_time::Instant;

use crate::error::ViewError;

/// Expansion state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeVisibility {
    /// Children are rendered.
    Expanded,
    /// Children are hidden.
    #[default]
    Collapsed,
}

impl NodeVisibility {
    /// Whether the node is open.
    #[must_use]
    pub const fn is_expanded(self) -> bool {
        matches!(self, Self::Expanded)
    }

    /// The opposite state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Expanded => Self::Collapsed,
            Self::Collapsed => Self::Expanded,
        }
    }

    /// Short label used in trace output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expanded => "expanded",
            Self::Collapsed => "collapsed",
        }
    }
}

/// Node id → expansion state, scoped per tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityState {
    trees: AHashMap<TreeId, AHashMap<NodeId, NodeVisibility>>,
}

impl VisibilityState {
    /// State recorded for a node, if any.
    #[must_use]
    pub fn get(&self, node: &TreeNode) -> Option<NodeVisibility> {
        self.trees
            .get(&node.tree_id)
            .and_then(|tree| tree.get(&node.id))
            .copied()
    }

    /// Number of nodes tracked across all trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.values().map(|tree| tree.len()).sum()
    }

    /// Whether no node is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of expanded nodes across all trees.
    #[must_use]
    pub fn expanded_count(&self) -> usize {
        self.trees
            .values()
            .flat_map(|tree| tree.values())
            .filter(|state| state.is_expanded())
            .count()
    }

    /// Ids of expanded nodes across all trees (unordered).
    pub fn expanded(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.trees
            .values()
            .flat_map(|tree| tree.iter())
            .filter(|(_, state)| state.is_expanded())
            .map(|(&id, _)| id)
    }

    /// Ids of expanded nodes in one tree (unordered).
    pub fn expanded_in(&self, tree_id: TreeId) -> impl Iterator<Item = NodeId> + '_ {
        self.trees
            .get(&tree_id)
            .into_iter()
            .flat_map(|tree| tree.iter())
            .filter(|(_, state)| state.is_expanded())
            .map(|(&id, _)| id)
    }

    pub(crate) fn set(&mut self, node: &TreeNode, state: NodeVisibility) {
        self.trees
            .entry(node.tree_id)
            .or_default()
            .insert(node.id, state);
    }
}

/// Rows whose rendered visibility changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityDelta {
    /// Newly rendered ids, in display order.
    pub shown: Vec<NodeId>,
    /// No longer rendered ids, in display order.
    pub hidden: Vec<NodeId>,
}

impl VisibilityDelta {
    /// Whether nothing changed on screen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shown.is_empty() && self.hidden.is_empty()
    }

    /// Every changed id, shown first.
    pub fn changed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.shown.iter().chain(self.hidden.iter()).copied()
    }

    fn between(before: &[NodeId], after: &[NodeId]) -> Self {
        let before_set: AHashSet<NodeId> = before.iter().copied().collect();
        let after_set: AHashSet<NodeId> = after.iter().copied().collect();
        Self {
            shown: after
                .iter()
                .copied()
                .filter(|id| !before_set.contains(id))
                .collect(),
            hidden: before
                .iter()
                .copied()
                .filter(|id| !after_set.contains(id))
                .collect(),
        }
    }
}

/// Result of [`VisibilityProjection::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// The toggled node.
    pub node: NodeId,
    /// Its state after the toggle.
    pub state: NodeVisibility,
    /// Rendered rows that appeared or disappeared.
    pub delta: VisibilityDelta,
    /// Open descendants that were closed along the way.
    pub force_collapsed: Vec<NodeId>,
}

/// Counts reported by [`VisibilityProjection::reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Nodes seen for the first time.
    pub added: usize,
    /// Tracked nodes no longer in the snapshot.
    pub removed: usize,
    /// Open nodes closed because an ancestor is collapsed.
    pub normalized: usize,
}

/// Owner of the expanded/collapsed map.
#[derive(Debug, Clone, Default)]
pub struct VisibilityProjection {
    pub(crate) state: VisibilityState,
    initial_expand_depth: u32,
}

impl VisibilityProjection {
    /// Seed state for every node: nodes shallower than
    /// `initial_expand_depth` start expanded, the rest collapsed.
    ///
    /// A depth of 0 renders only the top-level rows.
    #[must_use]
    pub fn new(nodes: &NodeSet, initial_expand_depth: u32) -> Self {
        let mut projection = Self {
            state: VisibilityState::default(),
            initial_expand_depth,
        };
        for node in nodes {
            let state = projection.initial_state(nodes, node);
            projection.state.set(node, state);
        }
        projection
    }

    /// Depth cutoff used for nodes without recorded state.
    #[must_use]
    pub fn initial_expand_depth(&self) -> u32 {
        self.initial_expand_depth
    }

    /// Read-only view of the map.
    #[must_use]
    pub fn state(&self) -> &VisibilityState {
        &self.state
    }

    /// State of `id`, or `None` if it is not in the snapshot.
    #[must_use]
    pub fn state_of(&self, nodes: &NodeSet, id: NodeId) -> Option<NodeVisibility> {
        let node = nodes.get(id)?;
        Some(self.current(nodes, node))
    }

    /// Whether `id` is open. Unknown ids read as collapsed.
    #[must_use]
    pub fn is_expanded(&self, nodes: &NodeSet, id: NodeId) -> bool {
        self.state_of(nodes, id)
            .is_some_and(NodeVisibility::is_expanded)
    }

    /// Whether every strict ancestor of `id` is expanded.
    #[must_use]
    pub fn is_rendered(&self, nodes: &NodeSet, id: NodeId) -> bool {
        if !nodes.contains(id) {
            return false;
        }
        nodes
            .ancestors(id)
            .iter()
            .all(|ancestor| self.current(nodes, ancestor).is_expanded())
    }

    /// Flip the state of `id` and report the rows that changed.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::UnknownNode`] if `id` is not in the snapshot.
    pub fn toggle(&mut self, nodes: &NodeSet, id: NodeId) -> Result<ToggleOutcome, ViewError> {
        let node = *nodes.get(id).ok_or(ViewError::UnknownNode(id))?;
        let start = Instant::now();
        let span = tracing::debug_span!(
            "pagetree.toggle",
            node = id.raw(),
            action = Empty,
            shown = Empty,
            hidden = Empty,
            duration_us = Empty
        )
        .entered();

        let rendered = self.is_rendered(nodes, id);
        let subtree = nodes.subtree(id);
        let before = if rendered {
            self.rendered_within(nodes, &node, subtree)
        } else {
            Vec::new()
        };

        let next = self.current(nodes, &node).toggled();
        self.state.set(&node, next);

        // Both directions leave every descendant closed; expanding therefore
        // reveals exactly one level.
        let mut force_collapsed = Vec::new();
        for desc in subtree {
            if self.current(nodes, desc).is_expanded() {
                self.state.set(desc, NodeVisibility::Collapsed);
                force_collapsed.push(desc.id);
            }
        }

        let after = if rendered {
            self.rendered_within(nodes, &node, subtree)
        } else {
            Vec::new()
        };
        let delta = VisibilityDelta::between(&before, &after);

        let duration_us = start.elapsed().as_micros() as u64;
        span.record("action", next.as_str());
        span.record("shown", delta.shown.len() as u64);
        span.record("hidden", delta.hidden.len() as u64);
        span.record("duration_us", duration_us);
        tracing::debug!(
            message = "pagetree.toggle",
            node = id.raw(),
            state = next.as_str(),
            rendered,
            shown = delta.shown.len(),
            hidden = delta.hidden.len(),
            force_collapsed = force_collapsed.len()
        );

        Ok(ToggleOutcome {
            node: id,
            state: next,
            delta,
            force_collapsed,
        })
    }

    /// Expand every collapsed ancestor of `id` so it becomes rendered.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::UnknownNode`] if `id` is not in the snapshot.
    pub fn reveal(&mut self, nodes: &NodeSet, id: NodeId) -> Result<VisibilityDelta, ViewError> {
        let node = *nodes.get(id).ok_or(ViewError::UnknownNode(id))?;
        let tree = nodes.tree(node.tree_id);
        let before = self.rendered_in(nodes, tree);
        for ancestor in nodes.ancestors(id) {
            self.state.set(ancestor, NodeVisibility::Expanded);
        }
        let after = self.rendered_in(nodes, tree);
        let delta = VisibilityDelta::between(&before, &after);
        tracing::debug!(
            message = "pagetree.reveal",
            node = id.raw(),
            shown = delta.shown.len()
        );
        Ok(delta)
    }

    /// Close every node.
    pub fn collapse_all(&mut self, nodes: &NodeSet) {
        for node in nodes {
            self.state.set(node, NodeVisibility::Collapsed);
        }
    }

    /// Reset every node to the depth rule with a new cutoff.
    pub fn expand_to_depth(&mut self, nodes: &NodeSet, depth: u32) {
        self.initial_expand_depth = depth;
        for node in nodes {
            let state = self.initial_state(nodes, node);
            self.state.set(node, state);
        }
    }

    /// Bring the map in line with a freshly loaded snapshot.
    ///
    /// Vanished nodes are dropped, new ones seeded from the depth rule, and
    /// any open node under a collapsed ancestor is closed.
    pub fn reconcile(&mut self, nodes: &NodeSet) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut next = VisibilityState::default();
        for node in nodes {
            let state = match self.state.get(node) {
                Some(state) => state,
                None => {
                    report.added += 1;
                    self.initial_state(nodes, node)
                }
            };
            next.set(node, state);
        }
        report.removed = self.state.len() + report.added - next.len();
        self.state = next;
        report.normalized = self.normalize(nodes);

        tracing::debug!(
            message = "pagetree.reconcile",
            added = report.added,
            removed = report.removed,
            normalized = report.normalized
        );
        report
    }

    /// Close open nodes hidden under a collapsed ancestor; returns how many.
    pub(crate) fn normalize(&mut self, nodes: &NodeSet) -> usize {
        let mut closed = 0;
        for tree_id in nodes.tree_ids() {
            let mut hidden_until: Option<u64> = None;
            for node in nodes.tree(tree_id) {
                if hidden_until.is_some_and(|rght| node.lft < rght) {
                    if self.current(nodes, node).is_expanded() {
                        self.state.set(node, NodeVisibility::Collapsed);
                        closed += 1;
                    }
                    continue;
                }
                hidden_until = None;
                if !self.current(nodes, node).is_expanded() {
                    hidden_until = Some(node.rght);
                }
            }
        }
        closed
    }

    pub(crate) fn current(&self, nodes: &NodeSet, node: &TreeNode) -> NodeVisibility {
        self.state
            .get(node)
            .unwrap_or_else(|| self.initial_state(nodes, node))
    }

    fn initial_state(&self, nodes: &NodeSet, node: &TreeNode) -> NodeVisibility {
        if nodes.depth(node) < self.initial_expand_depth {
            NodeVisibility::Expanded
        } else {
            NodeVisibility::Collapsed
        }
    }

    /// Rendered descendants of a rendered `root`, in display order.
    fn rendered_within(
        &self,
        nodes: &NodeSet,
        root: &TreeNode,
        subtree: &[TreeNode],
    ) -> Vec<NodeId> {
        if !self.current(nodes, root).is_expanded() {
            return Vec::new();
        }
        self.rendered_in(nodes, subtree)
    }

    /// Rendered ids of a pre-ordered run whose top-level entries are visible.
    pub(crate) fn rendered_in(&self, nodes: &NodeSet, run: &[TreeNode]) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut hidden_until: Option<u64> = None;
        for node in run {
            if hidden_until.is_some_and(|rght| node.lft < rght) {
                continue;
            }
            hidden_until = None;
            out.push(node.id);
            if !self.current(nodes, node).is_expanded() {
                hidden_until = Some(node.rght);
            }
        }
        out
    }
}
