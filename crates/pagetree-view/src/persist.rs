#![forbid(unsafe_code)]

//! Exportable expansion state.
//!
//! The projection itself is never written anywhere; callers that want
//! expansion to survive a page reload save a [`VisibilityPersistState`] and
//! hand it back after the next snapshot arrives.

use std::collections::BTreeSet;

use pagetree_core::{NodeId, NodeSet};
use serde::{Deserialize, Serialize};

use crate::visibility::{NodeVisibility, VisibilityProjection};

/// Persistable expansion state: the set of open node ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityPersistState {
    /// Ids of expanded nodes.
    pub expanded: BTreeSet<NodeId>,
}

impl VisibilityProjection {
    /// Capture the open nodes.
    #[must_use]
    pub fn save_state(&self) -> VisibilityPersistState {
        VisibilityPersistState {
            expanded: self.state().expanded().collect(),
        }
    }

    /// Apply saved state to `nodes`.
    ///
    /// Ids missing from the snapshot are ignored; nodes not listed are
    /// collapsed. Open nodes under a closed ancestor are then closed, so the
    /// result is the same as a [`reconcile`](Self::reconcile) would produce.
    /// Returns how many listed nodes were closed by that pass.
    pub fn restore_state(&mut self, nodes: &NodeSet, state: &VisibilityPersistState) -> usize {
        for node in nodes {
            let next = if state.expanded.contains(&node.id) {
                NodeVisibility::Expanded
            } else {
                NodeVisibility::Collapsed
            };
            self.state.set(node, next);
        }
        self.normalize(nodes)
    }
}
