#![forbid(unsafe_code)]

//! The select → target → commit/cancel state machine.
//!
//! ```text
//!            start_action              commit_action (valid)
//!   Idle ───────────────▶ ActionSelected ───────────▶ Committing ──▶ Idle
//!    ▲                      │  ▲    │
//!    └──── cancel_action ───┘  └────┘ start_action (supersedes)
//! ```
//!
//! # Invariants
//!
//! 1. At most one [`ActionSession`] is live.
//! 2. Starting an action while another is live cancels the old one first
//!    ([`CancelReason::Superseded`]); the newest start wins.
//! 3. A commit never produces a command without a live session, and never
//!    for a target the validator rejects.
//! 4. Commit is fire-and-forget: the controller is idle again when
//!    `commit_action` returns, whatever the sink reported.
//!
//! # Failure Modes
//!
//! - **Unknown node**: `start_action` leaves the current state untouched.
//! - **Rejected target**: the session stays live so another target can be
//!   picked; a [`TreeEvent::TargetRejected`] carries the user-facing text.

use pagetree_core::{NodeId, NodeSet};
use tracing::{debug, info, info_span};
use web_time::Instant;

use crate::action::{ActionKind, ActionSession, Position};
use crate::bus::EventBus;
use crate::dispatcher::{CommandDispatcher, DispatchReport, MutationCommand, build_command};
use crate::error::ActionError;
use crate::events::{CancelReason, TreeEvent};
use crate::validator::{ActionValidator, Candidate};

/// Observable phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    ActionSelected,
    Committing,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Idle,
    ActionSelected(ActionSession),
    Committing(MutationCommand),
}

/// Owner of the single live action session.
#[derive(Debug)]
pub struct TreeActionController {
    state: State,
    validator: ActionValidator,
    bus: EventBus<TreeEvent>,
    next_seq: u64,
}

impl TreeActionController {
    #[must_use]
    pub fn new(validator: ActionValidator, bus: EventBus<TreeEvent>) -> Self {
        Self {
            state: State::Idle,
            validator,
            bus,
            next_seq: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> ControllerPhase {
        match self.state {
            State::Idle => ControllerPhase::Idle,
            State::ActionSelected(_) => ControllerPhase::ActionSelected,
            State::Committing(_) => ControllerPhase::Committing,
        }
    }

    /// The live session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&ActionSession> {
        match &self.state {
            State::ActionSelected(session) => Some(session),
            State::Idle | State::Committing(_) => None,
        }
    }

    #[must_use]
    pub fn validator(&self) -> &ActionValidator {
        &self.validator
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus<TreeEvent> {
        &self.bus
    }

    /// Begin an action on `id`, replacing any live session.
    ///
    /// # Errors
    ///
    /// [`ActionError::UnknownNode`] if `id` is not in `nodes`; the current
    /// state is kept.
    pub fn start_action(
        &mut self,
        nodes: &NodeSet,
        id: NodeId,
        kind: ActionKind,
    ) -> Result<ActionSession, ActionError> {
        if !nodes.contains(id) {
            return Err(ActionError::UnknownNode(id));
        }
        self.cancel_with(CancelReason::Superseded);

        self.next_seq += 1;
        let session = ActionSession {
            source: id,
            kind,
            started_seq: self.next_seq,
        };
        self.state = State::ActionSelected(session);
        info!(
            message = "pagetree.action.start",
            source_id = id.raw(),
            action = kind.as_str(),
            seq = session.started_seq
        );
        self.bus.publish(TreeEvent::ActionStarted { session });
        Ok(session)
    }

    /// Drop the live session. Returns it, or `None` when idle.
    pub fn cancel_action(&mut self) -> Option<ActionSession> {
        self.cancel_with(CancelReason::User)
    }

    pub(crate) fn cancel_with(&mut self, reason: CancelReason) -> Option<ActionSession> {
        let State::ActionSelected(session) = self.state else {
            return None;
        };
        self.state = State::Idle;
        debug!(
            message = "pagetree.action.cancel",
            source_id = session.source.raw(),
            action = session.kind.as_str(),
            seq = session.started_seq,
            reason = reason.as_str()
        );
        self.bus
            .publish(TreeEvent::ActionCancelled { session, reason });
        Some(session)
    }

    /// Commit the live session onto `target` at `position`.
    ///
    /// # Errors
    ///
    /// - [`ActionError::NoActiveSession`] when idle.
    /// - [`ActionError::UnknownNode`] when the target or the source is not
    ///   in `nodes`.
    /// - [`ActionError::InvalidTarget`] when the validator refuses the pair;
    ///   the session stays live.
    pub fn commit_action(
        &mut self,
        nodes: &NodeSet,
        target: NodeId,
        position: Position,
        dispatcher: &mut CommandDispatcher,
    ) -> Result<DispatchReport, ActionError> {
        let State::ActionSelected(session) = self.state else {
            debug!(message = "pagetree.action.commit", outcome = "no-session");
            return Err(ActionError::NoActiveSession);
        };
        let source_node = nodes
            .get(session.source)
            .ok_or(ActionError::UnknownNode(session.source))?;
        let target_node = nodes.get(target).ok_or(ActionError::UnknownNode(target))?;

        if let Err(reason) = self
            .validator
            .check(session.kind, source_node, target_node, position)
        {
            debug!(
                message = "pagetree.action.reject",
                source_id = session.source.raw(),
                target_id = target.raw(),
                position = position.as_str(),
                action = session.kind.as_str(),
                reason = %reason
            );
            self.bus.publish(TreeEvent::TargetRejected {
                session,
                target,
                position,
                reason,
                message: reason.user_message(),
            });
            return Err(ActionError::InvalidTarget {
                source: session.source,
                target,
                position,
                reason,
            });
        }

        let start = Instant::now();
        let _span = info_span!(
            "pagetree.action.commit",
            source_id = session.source.raw(),
            target_id = target.raw(),
            action = session.kind.as_str(),
            seq = session.started_seq
        )
        .entered();

        let command = build_command(&session, target, position);
        self.state = State::Committing(command);
        let report = dispatcher.dispatch(command);
        self.state = State::Idle;

        info!(
            message = "pagetree.action.commit",
            position = position.as_str(),
            emitted = report.delivery.is_emitted(),
            duration_us = start.elapsed().as_micros() as u64
        );
        self.bus.publish(TreeEvent::ActionCommitted {
            command,
            endpoint: report.endpoint.clone(),
            delivery: report.delivery.clone(),
        });
        Ok(report)
    }

    /// Valid targets for the live session; empty when idle.
    #[must_use]
    pub fn candidate_targets(&self, nodes: &NodeSet) -> Vec<Candidate> {
        self.session()
            .map(|session| self.validator.candidate_targets(session, nodes))
            .unwrap_or_default()
    }
}
