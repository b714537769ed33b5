//! Pure transition validation.

use super::rules::{Effect, Party, rule_for};
use crate::placement::domain::{Actor, EntityRef, EntitySnapshot, OfferId, Role, Status};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// A requested status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    /// Entity to change.
    pub entity: EntityRef,
    /// Requested status.
    pub to: Status,
    /// Requesting principal.
    pub actor: Actor,
    /// Rejection reason or supervisor comment accompanying the change.
    pub note: Option<String>,
}

impl TransitionRequest {
    /// Creates a request without a note.
    #[must_use]
    pub const fn new(entity: EntityRef, to: Status, actor: Actor) -> Self {
        Self {
            entity,
            to,
            actor,
            note: None,
        }
    }

    /// Attaches a rejection reason or supervisor comment.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// An approved transition and the side effects it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    /// Entity being changed.
    pub entity: EntityRef,
    /// Status before the change.
    pub from: Status,
    /// Status after the change.
    pub to: Status,
    /// Principal the change is attributed to.
    pub actor: Actor,
    /// Rejection reason or supervisor comment.
    pub note: Option<String>,
    /// Side effects declared by the matching allow-list row.
    pub effects: &'static [Effect],
}

/// Why a transition was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The entity does not exist.
    #[error("{entity} not found")]
    NotFound {
        /// Requested entity.
        entity: EntityRef,
    },

    /// The actor is not allowed to trigger this edge.
    #[error("{role} may not move {entity} to {to}")]
    Forbidden {
        /// Requested entity.
        entity: EntityRef,
        /// Role of the refused actor.
        role: Role,
        /// Requested status.
        to: Status,
    },

    /// The edge is not in the allow-list.
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Requested entity.
        entity: EntityRef,
        /// Current status.
        from: Status,
        /// Requested status.
        to: Status,
    },

    /// The requested status name is not a status of the entity's kind.
    #[error("{entity} has no status named {status}")]
    UnknownStatus {
        /// Requested entity.
        entity: EntityRef,
        /// Unrecognised status name.
        status: String,
    },

    /// The entity already rests in the requested terminal status.
    #[error("{entity} is already {status}")]
    AlreadyTerminal {
        /// Requested entity.
        entity: EntityRef,
        /// Current terminal status.
        status: Status,
    },

    /// The entity already holds the requested non-terminal status.
    #[error("{entity} was changed concurrently")]
    Conflict {
        /// Requested entity.
        entity: EntityRef,
    },

    /// Rows touched by the transition kept changing underneath it, so it was
    /// not applied.
    #[error("{entity} could not be changed: {row} kept changing concurrently")]
    Contention {
        /// Requested entity.
        entity: EntityRef,
        /// Row whose version check failed last.
        row: String,
    },

    /// A date-gated edge was requested before its date.
    #[error("{entity} cannot move to {to} before {due}")]
    PrematureTransition {
        /// Requested entity.
        entity: EntityRef,
        /// Requested status.
        to: Status,
        /// First day the edge opens.
        due: NaiveDate,
    },

    /// Accepting would exceed the offer's positions.
    #[error("offer {offer_id} has no remaining capacity")]
    NoCapacity {
        /// Exhausted offer.
        offer_id: OfferId,
    },
}

impl RejectionReason {
    /// Returns the HTTP status code equivalent of the rejection.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Forbidden { .. } => 403,
            Self::InvalidTransition { .. }
            | Self::UnknownStatus { .. }
            | Self::PrematureTransition { .. } => 400,
            Self::AlreadyTerminal { .. }
            | Self::Conflict { .. }
            | Self::Contention { .. }
            | Self::NoCapacity { .. } => 409,
        }
    }

    /// Returns `true` when the requested state has already been reached, so
    /// the caller may treat the rejection as a no-op success.
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::AlreadyTerminal { .. } | Self::Conflict { .. })
    }
}

/// Validates a requested transition against the allow-list.
///
/// Checks run in a fixed order: existence, kind, duplicate request, edge,
/// party, date gate. The function never mutates anything.
///
/// # Errors
///
/// Returns the first [`RejectionReason`] that applies.
pub fn validate(
    request: &TransitionRequest,
    snapshot: Option<&EntitySnapshot>,
    today: NaiveDate,
) -> Result<TransitionPlan, RejectionReason> {
    let entity = request.entity;
    let Some(current) = snapshot else {
        return Err(RejectionReason::NotFound { entity });
    };
    let from = current.entity.status();
    let to = request.to;

    if current.entity.entity_ref() != entity || to.kind() != entity.kind() {
        return Err(RejectionReason::InvalidTransition { entity, from, to });
    }

    if from == to {
        return Err(if from.is_terminal() {
            RejectionReason::AlreadyTerminal {
                entity,
                status: from,
            }
        } else {
            RejectionReason::Conflict { entity }
        });
    }

    let rule = rule_for(from, to).ok_or(RejectionReason::InvalidTransition { entity, from, to })?;

    let admitted = rule
        .parties
        .iter()
        .any(|party: &Party| party.admits(&request.actor, current));
    if !admitted {
        return Err(RejectionReason::Forbidden {
            entity,
            role: request.actor.role,
            to,
        });
    }

    if let Some(due) = rule.gate.pending_until(current, today) {
        return Err(RejectionReason::PrematureTransition { entity, to, due });
    }

    Ok(TransitionPlan {
        entity,
        from,
        to,
        actor: request.actor,
        note: request.note.clone(),
        effects: rule.effects,
    })
}
