#![forbid(unsafe_code)]

//! Snapshot validation errors.

use std::fmt;

use crate::node::{NodeId, TreeId};

/// Reasons a node snapshot is rejected.
#[derive(Debug)]
pub enum SnapshotError {
    /// Two nodes share one identifier.
    DuplicateId(NodeId),
    /// A node's interval is empty or reversed (`lft >= rght`).
    InvertedInterval { id: NodeId, lft: u64, rght: u64 },
    /// Two intervals in one tree partially overlap or share a bound.
    OverlappingIntervals {
        tree_id: TreeId,
        first: NodeId,
        second: NodeId,
    },
    /// A node's level disagrees with the depth implied by containment.
    InconsistentLevel {
        id: NodeId,
        expected: u32,
        found: u32,
    },
    /// A node sits at the deepest representable level yet has children.
    LevelOverflow { id: NodeId, level: u32 },
    /// The snapshot could not be parsed.
    Json(serde_json::Error),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate node id {id}"),
            Self::InvertedInterval { id, lft, rght } => {
                write!(f, "node {id} has invalid interval ({lft}, {rght})")
            }
            Self::OverlappingIntervals {
                tree_id,
                first,
                second,
            } => write!(
                f,
                "nodes {first} and {second} overlap without nesting in tree {tree_id}"
            ),
            Self::InconsistentLevel {
                id,
                expected,
                found,
            } => write!(f, "node {id} has level {found}, expected {expected}"),
            Self::LevelOverflow { id, level } => {
                write!(f, "node {id} at level {level} cannot have children")
            }
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
