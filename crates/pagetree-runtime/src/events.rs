#![forbid(unsafe_code)]

//! Notifications published on the tree's [`EventBus`](crate::EventBus).

use pagetree_core::NodeId;
use pagetree_view::{NodeVisibility, ReconcileReport};

use crate::action::{ActionSession, Position};
use crate::dispatcher::{Delivery, MutationCommand};
use crate::validator::RejectReason;

/// Why a session ended without a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Explicit cancel from the source row.
    User,
    /// A new action was started over it.
    Superseded,
    /// A reloaded snapshot no longer contains the source.
    SourceRemoved,
}

impl CancelReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Superseded => "superseded",
            Self::SourceRemoved => "source-removed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    ActionStarted {
        session: ActionSession,
    },
    ActionCancelled {
        session: ActionSession,
        reason: CancelReason,
    },
    /// A commit was refused; the session stays live.
    TargetRejected {
        session: ActionSession,
        target: NodeId,
        position: Position,
        reason: RejectReason,
        /// Text for the person performing the action.
        message: &'static str,
    },
    ActionCommitted {
        command: MutationCommand,
        endpoint: String,
        delivery: Delivery,
    },
    VisibilityChanged {
        node: NodeId,
        state: NodeVisibility,
        shown: Vec<NodeId>,
        hidden: Vec<NodeId>,
    },
    SnapshotReloaded {
        nodes: usize,
        report: ReconcileReport,
    },
}

impl TreeEvent {
    /// Stable event name for listeners keyed by string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ActionStarted { .. } => "action-started",
            Self::ActionCancelled { .. } => "action-cancelled",
            Self::TargetRejected { .. } => "target-rejected",
            Self::ActionCommitted { .. } => "action-finished",
            Self::VisibilityChanged { .. } => "visibility-changed",
            Self::SnapshotReloaded { .. } => "snapshot-reloaded",
        }
    }
}
