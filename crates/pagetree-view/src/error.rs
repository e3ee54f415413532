#![forbid(unsafe_code)]

//! Visibility projection errors.

use std::fmt;

use pagetree_core::NodeId;

/// Errors from [`VisibilityProjection`](crate::VisibilityProjection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewError {
    /// The node is not part of the current snapshot.
    UnknownNode(NodeId),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "node {id} is not in the snapshot"),
        }
    }
}

impl std::error::Error for ViewError {}
