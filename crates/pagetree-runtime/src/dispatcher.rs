#![forbid(unsafe_code)]

//! Mutation commands and their hand-off to the persistence collaborator.
//!
//! [`build_command`] turns a committed session into a [`MutationCommand`],
//! the stable payload applied by whatever rewrites `lft`/`rght` on the other
//! side. [`CommandDispatcher`] resolves the endpoint for the action kind and
//! submits the request through a [`CommandSink`].
//!
//! Delivery is fire-and-forget from the controller's point of view: a sink
//! failure is logged and reported in the [`DispatchReport`], never rolled
//! back into controller state.
//!
//! # Wire format
//!
//! ```json
//! { "sourceId": 2, "targetId": 4, "position": "last-child", "actionKind": "move" }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use pagetree_core::NodeId;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use web_time::Instant;

use crate::action::{ActionKind, ActionSession, Position};
use crate::error::SinkError;

/// Structural mutation requested from the persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationCommand {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub position: Position,
    pub action_kind: ActionKind,
}

impl MutationCommand {
    /// Form-encoded fields as posted by the page admin (`node`, `target`,
    /// `position`).
    #[must_use]
    pub fn form_fields(&self) -> [(&'static str, String); 3] {
        [
            ("node", self.source_id.to_string()),
            ("target", self.target_id.to_string()),
            ("position", self.position.as_str().to_owned()),
        ]
    }

    /// JSON payload.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Build the command for committing `session` onto `target`.
#[must_use]
pub fn build_command(
    session: &ActionSession,
    target: NodeId,
    position: Position,
) -> MutationCommand {
    MutationCommand {
        source_id: session.source,
        target_id: target,
        position,
        action_kind: session.kind,
    }
}

/// Where each action kind is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub move_url: String,
    pub copy_url: String,
    pub duplicate_url: String,
    /// Page-creation URL; the target is passed as the `parent` query
    /// parameter.
    pub new_child_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            move_url: "/admin/pages/page/move/".into(),
            copy_url: "/admin/pages/page/copy/".into(),
            duplicate_url: "/admin/pages/page/duplicate/".into(),
            new_child_url: "/admin/pages/page/add/".into(),
        }
    }
}

impl EndpointConfig {
    /// Endpoint for one command.
    #[must_use]
    pub fn resolve(&self, command: &MutationCommand) -> String {
        match command.action_kind {
            ActionKind::Move => self.move_url.clone(),
            ActionKind::Copy => self.copy_url.clone(),
            ActionKind::Duplicate => self.duplicate_url.clone(),
            ActionKind::NewChild => format!("{}?parent={}", self.new_child_url, command.target_id),
        }
    }
}

/// A command addressed to its endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationRequest {
    pub endpoint: String,
    pub command: MutationCommand,
}

/// The persistence collaborator.
pub trait CommandSink {
    /// Accept one request.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the request cannot be handed over.
    fn submit(&mut self, request: &MutationRequest) -> Result<(), SinkError>;
}

/// Outcome of handing a command to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Emitted,
    Failed(String),
}

impl Delivery {
    #[must_use]
    pub fn is_emitted(&self) -> bool {
        matches!(self, Self::Emitted)
    }
}

/// What [`CommandDispatcher::dispatch`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub command: MutationCommand,
    pub endpoint: String,
    pub delivery: Delivery,
}

/// Resolves endpoints and forwards commands to a [`CommandSink`].
pub struct CommandDispatcher {
    endpoints: EndpointConfig,
    sink: Box<dyn CommandSink>,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    #[must_use]
    pub fn new(sink: impl CommandSink + 'static) -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            sink: Box::new(sink),
        }
    }

    /// Set the endpoint table.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.endpoints = endpoints;
        self
    }

    #[must_use]
    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    /// Address `command` without sending it.
    #[must_use]
    pub fn request_for(&self, command: MutationCommand) -> MutationRequest {
        MutationRequest {
            endpoint: self.endpoints.resolve(&command),
            command,
        }
    }

    /// Submit `command` and report the outcome.
    pub fn dispatch(&mut self, command: MutationCommand) -> DispatchReport {
        let request = self.request_for(command);
        let start = Instant::now();
        let delivery = match self.sink.submit(&request) {
            Ok(()) => Delivery::Emitted,
            Err(err) => {
                warn!(
                    message = "pagetree.dispatch.failed",
                    endpoint = %request.endpoint,
                    source_id = command.source_id.raw(),
                    target_id = command.target_id.raw(),
                    error = %err
                );
                Delivery::Failed(err.message().to_owned())
            }
        };
        info!(
            message = "pagetree.dispatch",
            endpoint = %request.endpoint,
            action = command.action_kind.as_str(),
            position = command.position.as_str(),
            source_id = command.source_id.raw(),
            target_id = command.target_id.raw(),
            emitted = delivery.is_emitted(),
            duration_us = start.elapsed().as_micros() as u64
        );
        DispatchReport {
            command,
            endpoint: request.endpoint,
            delivery,
        }
    }
}

/// In-memory sink that keeps every submitted request.
///
/// Clones share the recorded list, so a test can keep one handle while the
/// dispatcher owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    requests: Rc<RefCell<Vec<MutationRequest>>>,
    reject_with: Option<String>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records each request and then refuses it.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            requests: Rc::default(),
            reject_with: Some(message.into()),
        }
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<MutationRequest> {
        self.requests.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.borrow().is_empty()
    }
}

impl CommandSink for RecordingSink {
    fn submit(&mut self, request: &MutationRequest) -> Result<(), SinkError> {
        self.requests.borrow_mut().push(request.clone());
        match &self.reject_with {
            Some(message) => Err(SinkError::new(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(kind: ActionKind) -> ActionSession {
        ActionSession {
            source: NodeId::new(2),
            kind,
            started_seq: 0,
        }
    }

    #[test]
    fn command_payload_shape() {
        let command = build_command(
            &session(ActionKind::Move),
            NodeId::new(4),
            Position::LastChild,
        );
        assert_eq!(
            command.to_json().unwrap(),
            r#"{"sourceId":2,"targetId":4,"position":"last-child","actionKind":"move"}"#
        );
    }

    #[test]
    fn form_fields_use_admin_names() {
        let command = build_command(&session(ActionKind::Copy), NodeId::new(9), Position::Before);
        assert_eq!(
            command.form_fields(),
            [
                ("node", "2".to_owned()),
                ("target", "9".to_owned()),
                ("position", "left".to_owned())
            ]
        );
    }

    #[test]
    fn endpoints_per_kind() {
        let endpoints = EndpointConfig::default();
        let target = NodeId::new(7);
        let url = |kind| endpoints.resolve(&build_command(&session(kind), target, Position::After));
        assert_eq!(url(ActionKind::Move), "/admin/pages/page/move/");
        assert_eq!(url(ActionKind::Duplicate), "/admin/pages/page/duplicate/");
        assert_eq!(url(ActionKind::NewChild), "/admin/pages/page/add/?parent=7");
    }

    #[test]
    fn dispatch_records_request() {
        let sink = RecordingSink::new();
        let mut dispatcher = CommandDispatcher::new(sink.clone());
        let command = build_command(
            &session(ActionKind::Move),
            NodeId::new(4),
            Position::LastChild,
        );
        let report = dispatcher.dispatch(command);
        assert_eq!(report.delivery, Delivery::Emitted);
        assert_eq!(report.endpoint, "/admin/pages/page/move/");
        assert_eq!(sink.requests(), vec![dispatcher.request_for(command)]);
    }

    #[test]
    fn sink_failure_is_reported_not_raised() {
        let sink = RecordingSink::failing("backend offline");
        let mut dispatcher = CommandDispatcher::new(sink.clone());
        let command = build_command(&session(ActionKind::Copy), NodeId::new(4), Position::Before);
        let report = dispatcher.dispatch(command);
        assert_eq!(report.delivery, Delivery::Failed("backend offline".into()));
        assert_eq!(sink.len(), 1);
    }
}
