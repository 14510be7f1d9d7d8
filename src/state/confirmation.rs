use std::{collections::HashSet, time::Instant};

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::api::models::{EntrantId, RemoteResultStatus};

/// Where a match result stands in the two-sided acknowledgment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationState {
    /// Nothing has been submitted yet.
    NoResult,
    /// The creator submitted a result; the other side has to answer.
    PendingConfirmation,
    /// The other side accepted the result; ratings are applied by the backend.
    Confirmed,
    /// The other side rejected the result.
    Disputed,
}

impl ConfirmationState {
    /// Terminal states accept no further events.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConfirmationState::Confirmed | ConfirmationState::Disputed
        )
    }

    /// Position along the flow; states only ever move to a higher rank.
    fn rank(self) -> u8 {
        match self {
            ConfirmationState::NoResult => 0,
            ConfirmationState::PendingConfirmation => 1,
            ConfirmationState::Confirmed | ConfirmationState::Disputed => 2,
        }
    }
}

impl From<RemoteResultStatus> for ConfirmationState {
    fn from(value: RemoteResultStatus) -> Self {
        match value {
            RemoteResultStatus::PendingConfirmation | RemoteResultStatus::Unknown => {
                ConfirmationState::PendingConfirmation
            }
            RemoteResultStatus::Confirmed => ConfirmationState::Confirmed,
            RemoteResultStatus::Disputed => ConfirmationState::Disputed,
        }
    }
}

/// Actions a participant can take on a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationEvent {
    /// Creator submits (or re-submits) the score.
    Submit {
        /// Acting participant.
        by: EntrantId,
    },
    /// Opponent accepts the submitted score.
    Confirm {
        /// Acting participant.
        by: EntrantId,
    },
    /// Opponent rejects the submitted score.
    Dispute {
        /// Acting participant.
        by: EntrantId,
        /// Free-text justification.
        reason: String,
    },
}

/// Why an event cannot be applied. Role violations carry user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectedTransition {
    /// The event makes no sense in the current state.
    #[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
    InvalidTransition {
        /// State the machine was in.
        from: ConfirmationState,
        /// Event that was refused.
        event: ConfirmationEvent,
    },
    /// Only the room creator may submit or edit the result.
    #[error("Solo el creador de la sala puede cargar el resultado")]
    NotCreator,
    /// The creator cannot answer their own submission.
    #[error("El creador no puede confirmar ni disputar su propio resultado")]
    CreatorCannotRespond,
    /// Only players of the room may answer a submission.
    #[error("Solo los jugadores de la sala pueden confirmar o disputar el resultado")]
    NotParticipant,
    /// A dispute needs a justification.
    #[error("La disputa necesita una justificación")]
    MissingReason,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The event is not acceptable from the current state or for this actor.
    Rejected(RejectedTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State changed since the plan was created.
    StateMismatch {
        /// State when the plan was created.
        expected: ConfirmationState,
        /// Current state.
        actual: ConfirmationState,
    },
    /// Version changed since the plan was created.
    VersionMismatch {
        /// Version the plan expected to produce.
        expected: usize,
        /// Version the machine would produce now.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition waiting for the backend to acknowledge it.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// State before the transition.
    pub from: ConfirmationState,
    /// State after the transition.
    pub to: ConfirmationState,
    /// Event that triggered this transition.
    pub event: ConfirmationEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// When this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current state.
    pub state: ConfirmationState,
    /// Increments on each transition.
    pub version: usize,
    /// Target state of a planned but unapplied transition.
    pub pending: Option<ConfirmationState>,
}

/// Confirmation flow of one room's result.
///
/// Transitions are planned first, applied only once the backend acknowledged the action and
/// aborted otherwise, so local state never runs ahead of the server.
#[derive(Debug, Clone)]
pub struct ConfirmationMachine {
    creator: EntrantId,
    participants: HashSet<EntrantId>,
    state: ConfirmationState,
    version: usize,
    pending: Option<Plan>,
}

impl ConfirmationMachine {
    /// Fresh machine for a room without a result, played by `participants`.
    pub fn new(creator: EntrantId, participants: impl IntoIterator<Item = EntrantId>) -> Self {
        Self {
            creator,
            participants: participants.into_iter().collect(),
            state: ConfirmationState::NoResult,
            version: 0,
            pending: None,
        }
    }

    /// Machine resumed from what the backend currently reports.
    pub fn resume(
        creator: EntrantId,
        participants: impl IntoIterator<Item = EntrantId>,
        remote: Option<RemoteResultStatus>,
    ) -> Self {
        let mut machine = Self::new(creator, participants);
        if let Some(status) = remote {
            machine.observe(status.into());
        }
        machine
    }

    pub fn state(&self) -> ConfirmationState {
        self.state
    }

    pub fn creator(&self) -> &EntrantId {
        &self.creator
    }

    /// Replace the roster allowed to answer a submission.
    pub fn set_participants(&mut self, participants: impl IntoIterator<Item = EntrantId>) {
        self.participants = participants.into_iter().collect();
    }

    /// Create a snapshot of the machine.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Whether `actor` may edit the local score entry right now.
    pub fn ensure_can_edit(&self, actor: &EntrantId) -> Result<(), RejectedTransition> {
        self.compute_transition(&ConfirmationEvent::Submit { by: actor.clone() })
            .map(|_| ())
    }

    /// Whether `actor` may confirm or dispute right now.
    pub fn ensure_can_respond(&self, actor: &EntrantId) -> Result<(), RejectedTransition> {
        self.compute_transition(&ConfirmationEvent::Confirm { by: actor.clone() })
            .map(|_| ())
    }

    /// Validate an event against the current state and record it as pending.
    pub fn plan(&mut self, event: ConfirmationEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(&event)
            .map_err(PlanError::Rejected)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.state,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, returning the new state.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<ConfirmationState, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.state != plan.from {
            return Err(ApplyError::StateMismatch {
                expected: plan.from,
                actual: self.state,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.state = plan.to;
        self.version = plan.version_next;

        Ok(self.state)
    }

    /// Drop a planned transition, leaving the state untouched.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Fold in a state fetched from the backend. Only forward moves are taken; returns
    /// whether the state changed.
    pub fn observe(&mut self, remote: ConfirmationState) -> bool {
        if remote.rank() <= self.state.rank() {
            if remote != self.state {
                debug!(
                    local = ?self.state,
                    remote = ?remote,
                    "ignoring remote confirmation state that is not ahead of local"
                );
            }
            return false;
        }

        self.state = remote;
        self.version += 1;
        true
    }

    fn compute_transition(
        &self,
        event: &ConfirmationEvent,
    ) -> Result<ConfirmationState, RejectedTransition> {
        let next = match (self.state, event) {
            (
                ConfirmationState::NoResult | ConfirmationState::PendingConfirmation,
                ConfirmationEvent::Submit { by },
            ) => {
                if *by != self.creator {
                    return Err(RejectedTransition::NotCreator);
                }
                ConfirmationState::PendingConfirmation
            }
            (ConfirmationState::PendingConfirmation, ConfirmationEvent::Confirm { by }) => {
                self.ensure_responder(by)?;
                ConfirmationState::Confirmed
            }
            (ConfirmationState::PendingConfirmation, ConfirmationEvent::Dispute { by, reason }) => {
                self.ensure_responder(by)?;
                if reason.trim().is_empty() {
                    return Err(RejectedTransition::MissingReason);
                }
                ConfirmationState::Disputed
            }
            (from, event) => {
                return Err(RejectedTransition::InvalidTransition {
                    from,
                    event: event.clone(),
                });
            }
        };

        Ok(next)
    }

    fn ensure_responder(&self, by: &EntrantId) -> Result<(), RejectedTransition> {
        if *by == self.creator {
            return Err(RejectedTransition::CreatorCannotRespond);
        }
        if !self.participants.contains(by) {
            return Err(RejectedTransition::NotParticipant);
        }
        Ok(())
    }
}
