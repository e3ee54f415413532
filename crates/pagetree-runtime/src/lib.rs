#![forbid(unsafe_code)]

//! Runtime: the select → target → commit interaction over a page tree.
//!
//! # Role in pagetree
//! `pagetree-runtime` drives multi-step reordering. It validates targets
//! against the nested-set structure, keeps the single live action session,
//! builds mutation commands for the persistence collaborator, and
//! publishes every state change as a [`TreeEvent`].
//!
//! # Primary responsibilities
//! - **ActionValidator**: which `(target, position)` pairs an action accepts.
//! - **TreeActionController**: the Idle / ActionSelected / Committing machine.
//! - **CommandDispatcher**: command payloads, endpoints, and the sink seam.
//! - **EventBus**: single-threaded observer channel with RAII subscriptions.
//! - **TreeView**: snapshot + visibility + controller behind one handle.
//! - **TreeViewConfig**: tunables loaded from TOML or JSON.
//!
//! # How it fits in the system
//! Reads snapshots from `pagetree-core` and visibility from `pagetree-view`.
//! It never rewrites intervals; commits leave as [`MutationCommand`]s and
//! return as a new snapshot passed to [`TreeView::reload`].

pub mod action;
pub mod affordance;
pub mod bus;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod validator;
pub mod view;

pub use action::{ActionKind, ActionSession, Position};
pub use affordance::{RowAffordance, TreeRow};
pub use bus::{EventBus, Subscription};
pub use config::{ConfigError, TreeViewConfig};
pub use controller::{ControllerPhase, TreeActionController};
pub use dispatcher::{
    CommandDispatcher, CommandSink, Delivery, DispatchReport, EndpointConfig, MutationCommand,
    MutationRequest, RecordingSink, build_command,
};
pub use error::{ActionError, SinkError};
pub use events::{CancelReason, TreeEvent};
pub use validator::{ActionValidator, Candidate, DuplicateRule, RejectReason};
pub use view::TreeView;
