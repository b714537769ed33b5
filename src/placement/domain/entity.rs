//! Kind-tagged views over the workflow entities.

use super::{
    Application, ApplicationId, Attendance, AttendanceId, EntityKind, Evaluation, EvaluationId,
    Internship, InternshipId, LogbookEntry, LogbookEntryId, PlacementDomainError, Revision,
    Status, UserId,
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Typed reference to a workflow entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    /// Application reference.
    Application(ApplicationId),
    /// Internship reference.
    Internship(InternshipId),
    /// Logbook entry reference.
    LogbookEntry(LogbookEntryId),
    /// Attendance reference.
    Attendance(AttendanceId),
    /// Evaluation reference.
    Evaluation(EvaluationId),
}

impl EntityRef {
    /// Builds a reference from an entity kind and a raw identifier, as
    /// received from an external caller.
    #[must_use]
    pub const fn from_parts(kind: EntityKind, id: Uuid) -> Self {
        match kind {
            EntityKind::Application => Self::Application(ApplicationId::from_uuid(id)),
            EntityKind::Internship => Self::Internship(InternshipId::from_uuid(id)),
            EntityKind::LogbookEntry => Self::LogbookEntry(LogbookEntryId::from_uuid(id)),
            EntityKind::Attendance => Self::Attendance(AttendanceId::from_uuid(id)),
            EntityKind::Evaluation => Self::Evaluation(EvaluationId::from_uuid(id)),
        }
    }

    /// Returns the referenced kind.
    #[must_use]
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::Application(_) => EntityKind::Application,
            Self::Internship(_) => EntityKind::Internship,
            Self::LogbookEntry(_) => EntityKind::LogbookEntry,
            Self::Attendance(_) => EntityKind::Attendance,
            Self::Evaluation(_) => EntityKind::Evaluation,
        }
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        match self {
            Self::Application(id) => id.into_inner(),
            Self::Internship(id) => id.into_inner(),
            Self::LogbookEntry(id) => id.into_inner(),
            Self::Attendance(id) => id.into_inner(),
            Self::Evaluation(id) => id.into_inner(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.uuid())
    }
}

/// Any workflow entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Entity {
    /// Application.
    Application(Application),
    /// Internship.
    Internship(Internship),
    /// Logbook entry.
    LogbookEntry(LogbookEntry),
    /// Attendance record.
    Attendance(Attendance),
    /// Evaluation.
    Evaluation(Evaluation),
}

impl Entity {
    /// Returns the entity kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.entity_ref().kind()
    }

    /// Returns a typed reference to this entity.
    #[must_use]
    pub const fn entity_ref(&self) -> EntityRef {
        match self {
            Self::Application(inner) => EntityRef::Application(inner.id()),
            Self::Internship(inner) => EntityRef::Internship(inner.id()),
            Self::LogbookEntry(inner) => EntityRef::LogbookEntry(inner.id()),
            Self::Attendance(inner) => EntityRef::Attendance(inner.id()),
            Self::Evaluation(inner) => EntityRef::Evaluation(inner.id()),
        }
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Application(inner) => Status::Application(inner.status()),
            Self::Internship(inner) => Status::Internship(inner.status()),
            Self::LogbookEntry(inner) => Status::LogbookEntry(inner.status()),
            Self::Attendance(inner) => Status::Attendance(inner.status()),
            Self::Evaluation(inner) => Status::Evaluation(inner.status()),
        }
    }

    /// Returns the student the entity belongs to.
    #[must_use]
    pub const fn student_id(&self) -> UserId {
        match self {
            Self::Application(inner) => inner.student_id(),
            Self::Internship(inner) => inner.student_id(),
            Self::LogbookEntry(inner) => inner.student_id(),
            Self::Attendance(inner) => inner.student_id(),
            Self::Evaluation(inner) => inner.student_id(),
        }
    }

    /// Returns the owning internship for dependents, or the internship itself.
    #[must_use]
    pub const fn internship_id(&self) -> Option<InternshipId> {
        match self {
            Self::Application(_) => None,
            Self::Internship(inner) => Some(inner.id()),
            Self::LogbookEntry(inner) => Some(inner.internship_id()),
            Self::Attendance(inner) => Some(inner.internship_id()),
            Self::Evaluation(inner) => Some(inner.internship_id()),
        }
    }

    /// Returns the version and timestamps.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        match self {
            Self::Application(inner) => inner.revision(),
            Self::Internship(inner) => inner.revision(),
            Self::LogbookEntry(inner) => inner.revision(),
            Self::Attendance(inner) => inner.revision(),
            Self::Evaluation(inner) => inner.revision(),
        }
    }

    /// Returns the record version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.revision().version
    }

    /// Returns the application, if this is one.
    #[must_use]
    pub const fn as_application(&self) -> Option<&Application> {
        match self {
            Self::Application(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns the internship, if this is one.
    #[must_use]
    pub const fn as_internship(&self) -> Option<&Internship> {
        match self {
            Self::Internship(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns the logbook entry, if this is one.
    #[must_use]
    pub const fn as_logbook_entry(&self) -> Option<&LogbookEntry> {
        match self {
            Self::LogbookEntry(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns the attendance record, if this is one.
    #[must_use]
    pub const fn as_attendance(&self) -> Option<&Attendance> {
        match self {
            Self::Attendance(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns the evaluation, if this is one.
    #[must_use]
    pub const fn as_evaluation(&self) -> Option<&Evaluation> {
        match self {
            Self::Evaluation(inner) => Some(inner),
            _ => None,
        }
    }

    /// Moves the entity to `status`, bumping its revision.
    ///
    /// `note` becomes the rejection reason of an application or the
    /// supervisor comment of a reviewed logbook entry; other kinds ignore it.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementDomainError::StatusKindMismatch`] when `status`
    /// belongs to another entity kind.
    pub fn apply_status(
        &mut self,
        status: Status,
        note: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), PlacementDomainError> {
        match (self, status) {
            (Self::Application(inner), Status::Application(next)) => {
                inner.set_status(next, note, clock);
            }
            (Self::Internship(inner), Status::Internship(next)) => inner.set_status(next, clock),
            (Self::LogbookEntry(inner), Status::LogbookEntry(next)) => {
                inner.set_status(next, note, clock);
            }
            (Self::Attendance(inner), Status::Attendance(next)) => inner.set_status(next, clock),
            (Self::Evaluation(inner), Status::Evaluation(next)) => inner.set_status(next, clock),
            (entity, other) => {
                return Err(PlacementDomainError::StatusKindMismatch {
                    expected: entity.kind(),
                    found: other.kind(),
                });
            }
        }
        Ok(())
    }
}

impl From<Application> for Entity {
    fn from(value: Application) -> Self {
        Self::Application(value)
    }
}

impl From<Internship> for Entity {
    fn from(value: Internship) -> Self {
        Self::Internship(value)
    }
}

impl From<LogbookEntry> for Entity {
    fn from(value: LogbookEntry) -> Self {
        Self::LogbookEntry(value)
    }
}

impl From<Attendance> for Entity {
    fn from(value: Attendance) -> Self {
        Self::Attendance(value)
    }
}

impl From<Evaluation> for Entity {
    fn from(value: Evaluation) -> Self {
        Self::Evaluation(value)
    }
}

/// Entity plus the context the validator needs to authorise a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySnapshot {
    /// Current entity state.
    pub entity: Entity,
    /// Supervising doctor of the owning internship, when there is one.
    pub supervisor_id: Option<UserId>,
    /// Hospital that published the offer of an application.
    pub offer_hospital_id: Option<UserId>,
}

impl EntitySnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub const fn new(entity: Entity, supervisor_id: Option<UserId>) -> Self {
        Self {
            entity,
            supervisor_id,
            offer_hospital_id: None,
        }
    }

    /// Records the hospital that published the application's offer.
    #[must_use]
    pub const fn with_offer_hospital(mut self, hospital_id: UserId) -> Self {
        self.offer_hospital_id = Some(hospital_id);
        self
    }
}
