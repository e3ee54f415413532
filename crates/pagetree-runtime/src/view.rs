#![forbid(unsafe_code)]

//! [`TreeView`]: one page tree as the admin sees and edits it.
//!
//! Ties together the current [`NodeSet`] snapshot, its
//! [`VisibilityProjection`], the [`TreeActionController`] and the
//! [`CommandDispatcher`], and publishes every state change on one
//! [`EventBus`].
//!
//! A committed action does not touch the snapshot. The persistence
//! collaborator applies the command and hands back a new snapshot through
//! [`TreeView::reload`].

use ahash::AHashSet;
use pagetree_core::{NodeId, NodeSet};
use pagetree_view::{
    ReconcileReport, ToggleOutcome, ViewError, VisibilityDelta, VisibilityPersistState,
    VisibilityProjection,
};
use tracing::info;

use crate::action::{ActionKind, ActionSession, Position};
use crate::affordance::{RowAffordance, TreeRow, index_targets};
use crate::bus::{EventBus, Subscription};
use crate::config::TreeViewConfig;
use crate::controller::{ControllerPhase, TreeActionController};
use crate::dispatcher::{CommandDispatcher, CommandSink, DispatchReport};
use crate::error::ActionError;
use crate::events::{CancelReason, TreeEvent};
use crate::validator::{ActionValidator, Candidate};

#[derive(Debug)]
pub struct TreeView {
    nodes: NodeSet,
    visibility: VisibilityProjection,
    controller: TreeActionController,
    dispatcher: CommandDispatcher,
    bus: EventBus<TreeEvent>,
}

impl TreeView {
    /// Build a view over `nodes`, submitting commits to `sink`.
    #[must_use]
    pub fn new(nodes: NodeSet, config: &TreeViewConfig, sink: impl CommandSink + 'static) -> Self {
        let bus = EventBus::new();
        let validator = ActionValidator::new().with_duplicate_rule(config.duplicate_rule);
        Self {
            visibility: VisibilityProjection::new(&nodes, config.initial_expand_depth),
            controller: TreeActionController::new(validator, bus.clone()),
            dispatcher: CommandDispatcher::new(sink).with_endpoints(config.endpoints.clone()),
            nodes,
            bus,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    #[must_use]
    pub fn visibility(&self) -> &VisibilityProjection {
        &self.visibility
    }

    #[must_use]
    pub fn controller(&self) -> &TreeActionController {
        &self.controller
    }

    #[must_use]
    pub fn phase(&self) -> ControllerPhase {
        self.controller.phase()
    }

    #[must_use]
    pub fn session(&self) -> Option<&ActionSession> {
        self.controller.session()
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus<TreeEvent> {
        &self.bus
    }

    /// Shorthand for `self.bus().subscribe(..)`.
    pub fn subscribe(&self, callback: impl Fn(&TreeEvent) + 'static) -> Subscription {
        self.bus.subscribe(callback)
    }

    /// Expand or collapse `id`.
    ///
    /// # Errors
    ///
    /// [`ViewError::UnknownNode`] if `id` is not in the snapshot.
    pub fn toggle(&mut self, id: NodeId) -> Result<ToggleOutcome, ViewError> {
        let outcome = self.visibility.toggle(&self.nodes, id)?;
        self.bus.publish(TreeEvent::VisibilityChanged {
            node: id,
            state: outcome.state,
            shown: outcome.delta.shown.clone(),
            hidden: outcome.delta.hidden.clone(),
        });
        Ok(outcome)
    }

    /// Expand the ancestors of `id` so its row is rendered.
    ///
    /// # Errors
    ///
    /// [`ViewError::UnknownNode`] if `id` is not in the snapshot.
    pub fn reveal(&mut self, id: NodeId) -> Result<VisibilityDelta, ViewError> {
        let delta = self.visibility.reveal(&self.nodes, id)?;
        if !delta.is_empty() {
            let state = self
                .visibility
                .state_of(&self.nodes, id)
                .unwrap_or_default();
            self.bus.publish(TreeEvent::VisibilityChanged {
                node: id,
                state,
                shown: delta.shown.clone(),
                hidden: delta.hidden.clone(),
            });
        }
        Ok(delta)
    }

    /// See [`TreeActionController::start_action`].
    ///
    /// # Errors
    ///
    /// [`ActionError::UnknownNode`] if `id` is not in the snapshot.
    pub fn start_action(
        &mut self,
        id: NodeId,
        kind: ActionKind,
    ) -> Result<ActionSession, ActionError> {
        self.controller.start_action(&self.nodes, id, kind)
    }

    pub fn cancel_action(&mut self) -> Option<ActionSession> {
        self.controller.cancel_action()
    }

    /// See [`TreeActionController::commit_action`].
    ///
    /// # Errors
    ///
    /// Propagates the controller's [`ActionError`].
    pub fn commit_action(
        &mut self,
        target: NodeId,
        position: Position,
    ) -> Result<DispatchReport, ActionError> {
        self.controller
            .commit_action(&self.nodes, target, position, &mut self.dispatcher)
    }

    /// Valid targets for the live session, rendered or not.
    #[must_use]
    pub fn candidate_targets(&self) -> Vec<Candidate> {
        self.controller.candidate_targets(&self.nodes)
    }

    /// Valid targets whose rows are currently rendered.
    #[must_use]
    pub fn visible_targets(&self) -> Vec<Candidate> {
        let rendered: AHashSet<NodeId> = self
            .visibility
            .visible_nodes(&self.nodes)
            .into_iter()
            .collect();
        self.candidate_targets()
            .into_iter()
            .filter(|c| rendered.contains(&c.target))
            .collect()
    }

    /// Rendered rows with their controls, in display order.
    #[must_use]
    pub fn rows(&self) -> Vec<TreeRow> {
        let session = self.controller.session();
        let targets = index_targets(self.candidate_targets());
        self.visibility
            .visible_rows(&self.nodes)
            .into_iter()
            .map(|row| TreeRow {
                affordance: RowAffordance::for_row(row.id, session, &targets),
                row,
            })
            .collect()
    }

    /// Export which nodes are open.
    #[must_use]
    pub fn save_state(&self) -> VisibilityPersistState {
        self.visibility.save_state()
    }

    /// Re-apply exported state; returns how many listed nodes were closed
    /// because an ancestor is not open.
    pub fn restore_state(&mut self, state: &VisibilityPersistState) -> usize {
        self.visibility.restore_state(&self.nodes, state)
    }

    /// Swap in a fresh snapshot.
    ///
    /// Visibility is reconciled against it and a session whose source has
    /// vanished is cancelled ([`CancelReason::SourceRemoved`]).
    pub fn reload(&mut self, nodes: NodeSet) -> ReconcileReport {
        self.nodes = nodes;
        let report = self.visibility.reconcile(&self.nodes);
        let orphaned = self
            .controller
            .session()
            .is_some_and(|session| !self.nodes.contains(session.source));
        if orphaned {
            self.controller.cancel_with(CancelReason::SourceRemoved);
        }
        info!(
            message = "pagetree.reload",
            nodes = self.nodes.len(),
            added = report.added,
            removed = report.removed,
            normalized = report.normalized
        );
        self.bus.publish(TreeEvent::SnapshotReloaded {
            nodes: self.nodes.len(),
            report,
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::RecordingSink;
    use pagetree_core::TreeNode;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn nodes() -> NodeSet {
        NodeSet::from_nodes([
            TreeNode::new(1, 1, 0, 1, 10),
            TreeNode::new(2, 1, 1, 2, 5),
            TreeNode::new(3, 1, 2, 3, 4),
            TreeNode::new(4, 1, 1, 6, 9),
            TreeNode::new(5, 1, 2, 7, 8),
        ])
        .expect("valid snapshot")
    }

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw)
    }

    fn view(depth: u32) -> TreeView {
        let config = TreeViewConfig {
            initial_expand_depth: depth,
            ..TreeViewConfig::default()
        };
        TreeView::new(nodes(), &config, RecordingSink::new())
    }

    #[test]
    fn rows_offer_menu_when_idle() {
        let view = view(1);
        let rows = view.rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.affordance == RowAffordance::Default));
    }

    #[test]
    fn rows_reflect_session() {
        let mut view = view(2);
        view.start_action(id(2), ActionKind::Move).unwrap();
        let by_id: Vec<(u64, RowAffordance)> = view
            .rows()
            .into_iter()
            .map(|r| (r.row.id.raw(), r.affordance))
            .collect();
        assert_eq!(by_id[0], (1, RowAffordance::Targets(Position::ALL.to_vec())));
        assert_eq!(by_id[1], (2, RowAffordance::Cancel));
        assert_eq!(by_id[2], (3, RowAffordance::None));
        assert!(by_id[3].1.is_target());
    }

    #[test]
    fn visible_targets_skip_hidden_rows() {
        let mut view = view(1);
        view.start_action(id(2), ActionKind::Copy).unwrap();
        let all: Vec<u64> = view.candidate_targets().iter().map(|c| c.target.raw()).collect();
        let shown: Vec<u64> = view.visible_targets().iter().map(|c| c.target.raw()).collect();
        assert_eq!(all, vec![1, 3, 4, 5]);
        assert_eq!(shown, vec![1, 4]);
    }

    #[test]
    fn visible_targets_follow_toggles() {
        let mut view = view(0);
        view.start_action(id(3), ActionKind::Copy).unwrap();
        let shown = |v: &TreeView| -> Vec<u64> {
            v.visible_targets().iter().map(|c| c.target.raw()).collect()
        };
        assert_eq!(shown(&view), vec![1]);
        view.toggle(id(1)).unwrap();
        view.toggle(id(4)).unwrap();
        assert_eq!(shown(&view), vec![1, 2, 4, 5]);
        view.toggle(id(1)).unwrap();
        assert_eq!(shown(&view), vec![1]);
    }

    #[test]
    fn toggle_publishes_visibility_change() {
        let mut view = view(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = Rc::clone(&seen);
            view.subscribe(move |e| {
                if let TreeEvent::VisibilityChanged { shown, .. } = e {
                    seen.borrow_mut().push(shown.len());
                }
            })
        };
        view.toggle(id(4)).unwrap();
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn reload_cancels_orphaned_session() {
        let mut view = view(1);
        view.start_action(id(3), ActionKind::Move).unwrap();
        let cancelled = Rc::new(RefCell::new(None));
        let _sub = {
            let cancelled = Rc::clone(&cancelled);
            view.subscribe(move |e| {
                if let TreeEvent::ActionCancelled { reason, .. } = e {
                    *cancelled.borrow_mut() = Some(*reason);
                }
            })
        };

        let without_a1 = NodeSet::from_nodes([
            TreeNode::new(1, 1, 0, 1, 8),
            TreeNode::new(2, 1, 1, 2, 3),
            TreeNode::new(4, 1, 1, 4, 7),
            TreeNode::new(5, 1, 2, 5, 6),
        ])
        .unwrap();
        let report = view.reload(without_a1);
        assert_eq!(report.removed, 1);
        assert_eq!(view.phase(), ControllerPhase::Idle);
        assert_eq!(*cancelled.borrow(), Some(CancelReason::SourceRemoved));
    }

    #[test]
    fn reveal_then_save_restore() {
        let mut view = view(0);
        view.reveal(id(5)).unwrap();
        assert!(view.visibility().is_rendered(view.nodes(), id(5)));
        let saved = view.save_state();
        view.toggle(id(1)).unwrap();
        assert!(!view.visibility().is_rendered(view.nodes(), id(5)));
        assert_eq!(view.restore_state(&saved), 0);
        assert!(view.visibility().is_rendered(view.nodes(), id(5)));
    }
}
