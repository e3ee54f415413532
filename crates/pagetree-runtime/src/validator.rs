#![forbid(unsafe_code)]

//! Structural validity of action targets.
//!
//! A target is rejected when applying the action would make a node its own
//! ancestor. Self-targets are always rejected; a move additionally rejects
//! every node inside the source's subtree. Copies and new children read the
//! source without relocating it, so they may land anywhere else.
//!
//! # Invariants
//!
//! 1. `check(.., source, source, ..)` is always `Err(SelfTarget)`.
//! 2. For [`ActionKind::Move`], every transitive descendant of the source is
//!    rejected and every node outside the source's subtree is accepted.
//! 3. Results are recomputed on every call; nothing is cached across action
//!    kinds.

use std::fmt;

use pagetree_core::{NodeId, NodeSet, TreeNode};
use serde::{Deserialize, Serialize};

use crate::action::{ActionKind, ActionSession, Position};

/// How [`ActionKind::Duplicate`] treats targets inside the source subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateRule {
    /// Like a copy: only the source itself is excluded.
    #[default]
    Unrestricted,
    /// Like a move: the source's descendants are excluded too.
    LikeMove,
}

/// Why a target was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The target is the source node.
    SelfTarget,
    /// The target lies inside the source's subtree.
    DescendantOfSource,
}

impl RejectReason {
    /// Message suitable for showing to the person performing the action.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::SelfTarget => "A page cannot be placed relative to itself",
            Self::DescendantOfSource => {
                "A page cannot be made a child or sibling of one of its descendants"
            }
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfTarget => f.write_str("target is the source node"),
            Self::DescendantOfSource => f.write_str("target is a descendant of the source"),
        }
    }
}

/// A node that accepts the current action, with the positions it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub target: NodeId,
    pub positions: Vec<Position>,
}

/// Target rules for every action kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionValidator {
    duplicate_rule: DuplicateRule,
}

impl ActionValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate rule.
    #[must_use]
    pub fn with_duplicate_rule(mut self, rule: DuplicateRule) -> Self {
        self.duplicate_rule = rule;
        self
    }

    #[must_use]
    pub fn duplicate_rule(&self) -> DuplicateRule {
        self.duplicate_rule
    }

    /// Check one `(target, position)` pair for an action of `kind` on `source`.
    ///
    /// # Errors
    ///
    /// Returns the [`RejectReason`] when the pair is structurally invalid.
    pub fn check(
        &self,
        kind: ActionKind,
        source: &TreeNode,
        target: &TreeNode,
        _position: Position,
    ) -> Result<(), RejectReason> {
        if target.id == source.id {
            return Err(RejectReason::SelfTarget);
        }
        if self.excludes_subtree(kind) && target.is_descendant_of(source) {
            return Err(RejectReason::DescendantOfSource);
        }
        Ok(())
    }

    /// Whether `target` at `position` is valid for the live session.
    #[must_use]
    pub fn is_valid_target(
        &self,
        session: &ActionSession,
        source: &TreeNode,
        target: &TreeNode,
        position: Position,
    ) -> bool {
        self.check(session.kind, source, target, position).is_ok()
    }

    /// Every node accepting at least one position, in display order.
    ///
    /// Empty when the source is not in `nodes` or nothing qualifies.
    #[must_use]
    pub fn candidate_targets(&self, session: &ActionSession, nodes: &NodeSet) -> Vec<Candidate> {
        let Some(source) = nodes.get(session.source) else {
            return Vec::new();
        };
        nodes
            .iter()
            .filter_map(|target| {
                let positions: Vec<Position> = Position::ALL
                    .into_iter()
                    .filter(|&p| self.is_valid_target(session, source, target, p))
                    .collect();
                (!positions.is_empty()).then(|| Candidate {
                    target: target.id,
                    positions,
                })
            })
            .collect()
    }

    fn excludes_subtree(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Move => true,
            ActionKind::Copy | ActionKind::NewChild => false,
            ActionKind::Duplicate => self.duplicate_rule == DuplicateRule::LikeMove,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // R(1,10,0) -> A(2,5,1) -> A1(3,4,2); R -> B(6,9,1) -> B1(7,8,2)
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

    fn session(source: u64, kind: ActionKind) -> ActionSession {
        ActionSession {
            source: NodeId::new(source),
            kind,
            started_seq: 1,
        }
    }

    fn targets(candidates: &[Candidate]) -> Vec<u64> {
        candidates.iter().map(|c| c.target.raw()).collect()
    }

    #[test]
    fn self_target_always_rejected() {
        let nodes = nodes();
        let a = nodes.get(NodeId::new(2)).unwrap();
        let validator = ActionValidator::new();
        for kind in ActionKind::ALL {
            assert_eq!(
                validator.check(kind, a, a, Position::LastChild),
                Err(RejectReason::SelfTarget)
            );
        }
    }

    #[test]
    fn move_excludes_subtree() {
        let nodes = nodes();
        let validator = ActionValidator::new();
        let got = validator.candidate_targets(&session(2, ActionKind::Move), &nodes);
        assert_eq!(targets(&got), vec![1, 4, 5]);
        assert!(got.iter().all(|c| c.positions == Position::ALL.to_vec()));
    }

    #[test]
    fn copy_and_new_child_allow_subtree() {
        let nodes = nodes();
        let validator = ActionValidator::new();
        for kind in [ActionKind::Copy, ActionKind::NewChild] {
            let got = validator.candidate_targets(&session(2, kind), &nodes);
            assert_eq!(targets(&got), vec![1, 3, 4, 5]);
        }
    }

    #[test]
    fn duplicate_rule_is_configurable() {
        let nodes = nodes();
        let loose = ActionValidator::new();
        let strict = ActionValidator::new().with_duplicate_rule(DuplicateRule::LikeMove);
        let s = session(2, ActionKind::Duplicate);
        assert_eq!(targets(&loose.candidate_targets(&s, &nodes)), vec![1, 3, 4, 5]);
        assert_eq!(targets(&strict.candidate_targets(&s, &nodes)), vec![1, 4, 5]);
    }

    #[test]
    fn descendant_reason_reported() {
        let nodes = nodes();
        let r = nodes.get(NodeId::new(1)).unwrap();
        let a1 = nodes.get(NodeId::new(3)).unwrap();
        assert_eq!(
            ActionValidator::new().check(ActionKind::Move, r, a1, Position::Before),
            Err(RejectReason::DescendantOfSource)
        );
        // Moving the root leaves nothing in its tree to land on.
        let got = ActionValidator::new().candidate_targets(&session(1, ActionKind::Move), &nodes);
        assert!(got.is_empty());
    }

    #[test]
    fn unknown_source_yields_no_candidates() {
        let nodes = nodes();
        let got = ActionValidator::new().candidate_targets(&session(42, ActionKind::Copy), &nodes);
        assert!(got.is_empty());
    }
}
