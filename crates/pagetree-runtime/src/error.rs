#![forbid(unsafe_code)]

//! Action and delivery errors.

use std::fmt;

use pagetree_core::NodeId;

use crate::action::Position;
use crate::validator::RejectReason;

/// Errors from [`TreeActionController`](crate::TreeActionController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// A referenced node is not in the snapshot.
    UnknownNode(NodeId),
    /// Commit was requested with no action in progress.
    NoActiveSession,
    /// The target cannot receive the source at this position.
    InvalidTarget {
        source: NodeId,
        target: NodeId,
        position: Position,
        reason: RejectReason,
    },
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "node {id} is not in the snapshot"),
            Self::NoActiveSession => f.write_str("no action in progress"),
            Self::InvalidTarget {
                source,
                target,
                position,
                reason,
            } => write!(
                f,
                "cannot place {source} {position} of {target}: {reason}"
            ),
        }
    }
}

impl std::error::Error for ActionError {}

/// Failure reported by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    message: String,
}

impl SinkError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mutation not accepted: {}", self.message)
    }
}

impl std::error::Error for SinkError {}
