#![forbid(unsafe_code)]

//! Core: node identity, nested-set interval queries, and validated snapshots.
//!
//! # Role in pagetree
//! `pagetree-core` is the data layer. It owns the [`TreeNode`] quadruple
//! `(tree_id, level, lft, rght)`, the pure interval queries that derive
//! ancestry from containment, and the [`NodeSet`] snapshot that every other
//! layer reads.
//!
//! # Primary responsibilities
//! - **TreeNode / NodeId / TreeId**: identity and position of one page.
//! - **interval**: containment, children, range and ordering queries.
//! - **NodeSet**: a validated, read-only forest keyed by id.
//!
//! # How it fits in the system
//! The visibility projection (`pagetree-view`) and the action runtime
//! (`pagetree-runtime`) only ever read snapshots built here. Rewriting
//! intervals after a move is the persistence collaborator's job; this crate
//! never mutates a stored interval.

pub mod error;
pub mod interval;
pub mod node;
pub mod node_set;

pub use error::SnapshotError;
pub use node::{NodeId, TreeId, TreeNode};
pub use node_set::NodeSet;
