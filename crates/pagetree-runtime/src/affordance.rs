#![forbid(unsafe_code)]

//! Which controls each visible row offers.
//!
//! With no action in progress every row offers the action menu. Once an
//! action starts, the source row offers only cancel, valid targets offer
//! their accepted positions, and every other row goes quiet.

use ahash::AHashMap;
use pagetree_core::NodeId;
use pagetree_view::VisibleRow;

use crate::action::{ActionKind, ActionSession, Position};
use crate::validator::Candidate;

/// Candidate positions keyed by target id.
pub(crate) type TargetIndex = AHashMap<NodeId, Vec<Position>>;

pub(crate) fn index_targets(candidates: Vec<Candidate>) -> TargetIndex {
    candidates
        .into_iter()
        .map(|c| (c.target, c.positions))
        .collect()
}

/// Controls attached to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAffordance {
    /// No session: the action menu.
    Default,
    /// The row is the session's source.
    Cancel,
    /// The row accepts the source at these positions.
    Targets(Vec<Position>),
    /// Session active and this row is not a valid target.
    None,
}

impl RowAffordance {
    /// Actions offered by [`RowAffordance::Default`].
    pub const MENU: [ActionKind; 4] = ActionKind::ALL;

    pub(crate) fn for_row(
        id: NodeId,
        session: Option<&ActionSession>,
        targets: &TargetIndex,
    ) -> Self {
        let Some(session) = session else {
            return Self::Default;
        };
        if session.source == id {
            return Self::Cancel;
        }
        match targets.get(&id) {
            Some(positions) => Self::Targets(positions.clone()),
            None => Self::None,
        }
    }

    #[must_use]
    pub fn is_target(&self) -> bool {
        matches!(self, Self::Targets(_))
    }
}

/// A visible row with its controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub row: VisibleRow,
    pub affordance: RowAffordance,
}
