#![forbid(unsafe_code)]

//! pagetree public facade crate.
//!
//! Re-exports the snapshot, visibility and runtime layers and offers a
//! prelude for day-to-day use. Applications usually need only [`TreeView`],
//! a [`CommandSink`] for their persistence layer, and [`logging::init`].
//!
//! ```rust,ignore
//! use pagetree::prelude::*;
//!
//! pagetree::logging::init();
//! let nodes = NodeSet::from_json_str(snapshot_json)?;
//! let config = TreeViewConfig::from_toml_file("pagetree.toml")?;
//! let mut view = TreeView::new(nodes, &config, RecordingSink::new());
//! view.start_action(NodeId::new(2), ActionKind::Move)?;
//! let report = view.commit_action(NodeId::new(4), Position::LastChild)?;
//! ```

use std::fmt;

pub mod logging;

// --- Core re-exports -------------------------------------------------------

pub use pagetree_core::interval;
pub use pagetree_core::{NodeId, NodeSet, SnapshotError, TreeId, TreeNode};

// --- View re-exports -------------------------------------------------------

pub use pagetree_view::{
    NodeVisibility, ReconcileReport, ToggleOutcome, ViewError, VisibilityDelta,
    VisibilityPersistState, VisibilityProjection, VisibleRow,
};

// --- Runtime re-exports ----------------------------------------------------

pub use pagetree_runtime::{
    ActionError, ActionKind, ActionSession, ActionValidator, Candidate, CancelReason,
    CommandDispatcher, CommandSink, ConfigError, ControllerPhase, Delivery, DispatchReport,
    DuplicateRule, EndpointConfig, EventBus, MutationCommand, MutationRequest, Position,
    RecordingSink, RejectReason, RowAffordance, SinkError, Subscription, TreeActionController,
    TreeEvent, TreeRow, TreeView, TreeViewConfig, build_command,
};

// --- Errors ------------------------------------------------------------------

/// Any error surfaced by pagetree.
///
/// A sink refusing a commit is not an error here: commits are
/// fire-and-forget and the refusal arrives as [`Delivery::Failed`].
#[derive(Debug)]
pub enum Error {
    /// The node snapshot was rejected.
    Snapshot(SnapshotError),
    /// A visibility operation named an unknown node.
    View(ViewError),
    /// An action could not be started or committed.
    Action(ActionError),
    /// Configuration could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot(err) => write!(f, "{err}"),
            Self::View(err) => write!(f, "{err}"),
            Self::Action(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Snapshot(err) => Some(err),
            Self::View(err) => Some(err),
            Self::Action(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<SnapshotError> for Error {
    fn from(err: SnapshotError) -> Self {
        Self::Snapshot(err)
    }
}

impl From<ViewError> for Error {
    fn from(err: ViewError) -> Self {
        Self::View(err)
    }
}

impl From<ActionError> for Error {
    fn from(err: ActionError) -> Self {
        Self::Action(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for pagetree APIs.
pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::{
        ActionKind, CommandSink, Error, NodeId, NodeSet, Position, RecordingSink, Result,
        TreeEvent, TreeNode, TreeView, TreeViewConfig,
    };

    pub use crate::{core, runtime, view};
}

pub use pagetree_core as core;
pub use pagetree_runtime as runtime;
pub use pagetree_view as view;
