#![forbid(unsafe_code)]

//! Visibility: which nodes of a forest are currently rendered.
//!
//! # Role in pagetree
//! `pagetree-view` keeps the expanded/collapsed projection of a
//! [`NodeSet`](pagetree_core::NodeSet) consistent as subtrees are toggled,
//! revealed, or replaced by a fresh snapshot.
//!
//! # Primary responsibilities
//! - **VisibilityProjection**: toggle, reveal, reconcile and bulk resets.
//! - **Rows**: flattened visible rows in display order.
//! - **Persistence**: export and re-apply the set of open nodes.

pub mod error;
pub mod persist;
pub mod rows;
pub mod visibility;

pub use error::ViewError;
pub use persist::VisibilityPersistState;
pub use rows::VisibleRow;
pub use visibility::{
    NodeVisibility, ReconcileReport, ToggleOutcome, VisibilityDelta, VisibilityProjection,
    VisibilityState,
};
