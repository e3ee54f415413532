#![forbid(unsafe_code)]

//! Action kinds, target positions, and the live action session.

use std::fmt;

use pagetree_core::NodeId;
use serde::{Deserialize, Serialize};

/// What the user asked to do with the source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Relocate the source subtree.
    Move,
    /// Copy the source subtree to the target.
    Copy,
    /// Duplicate the source subtree next to or under the target.
    Duplicate,
    /// Create a new child page anchored on the target.
    NewChild,
}

impl ActionKind {
    /// Every kind, in the order the row controls list them.
    pub const ALL: [Self; 4] = [Self::Move, Self::Copy, Self::Duplicate, Self::NewChild];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Duplicate => "duplicate",
            Self::NewChild => "new-child",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placement relative to the target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// Preceding sibling at the target's level.
    #[serde(rename = "left")]
    Before,
    /// Following sibling at the target's level.
    #[serde(rename = "right")]
    After,
    /// Last child of the target.
    #[serde(rename = "last-child")]
    LastChild,
}

impl Position {
    pub const ALL: [Self; 3] = [Self::Before, Self::After, Self::LastChild];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "left",
            Self::After => "right",
            Self::LastChild => "last-child",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The in-progress action. At most one exists at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSession {
    pub source: NodeId,
    pub kind: ActionKind,
    /// Monotonic start counter, for correlating trace output.
    pub started_seq: u64,
}
