//! Error types for placement domain validation and parsing.

use super::{AttendanceStatus, EntityKind, InternshipId, InternshipStatus, OfferId, UserId};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned while constructing placement domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlacementDomainError {
    /// A date range does not end after it starts.
    #[error("invalid date range: {start} is not before {end}")]
    InvalidDateRange {
        /// Requested first day.
        start: NaiveDate,
        /// Requested end day.
        end: NaiveDate,
    },

    /// An offer must provide at least one position.
    #[error("an offer must provide at least one position, got {0}")]
    InvalidPositions(u32),

    /// The offer title is empty after trimming.
    #[error("offer title must not be empty")]
    EmptyTitle,

    /// Attendance hours must fit in one day.
    #[error("attendance hours must be between 1 and 24, got {0}")]
    InvalidHours(u32),

    /// Evaluation scores are percentages.
    #[error("evaluation score must be between 0 and 100, got {0}")]
    InvalidScore(u8),

    /// Attendance cannot be recorded directly in a validated status.
    #[error("attendance cannot be recorded as {0}")]
    InvalidInitialAttendance(AttendanceStatus),

    /// Dependents can only be created for upcoming or active internships.
    #[error("internship {internship_id} is {status} and accepts no new records")]
    InternshipClosed {
        /// Internship identifier.
        internship_id: InternshipId,
        /// Current internship status.
        status: InternshipStatus,
    },

    /// A dated record falls outside the internship period.
    #[error("{date} is outside internship {internship_id}")]
    OutsideInternship {
        /// Internship identifier.
        internship_id: InternshipId,
        /// Offending date.
        date: NaiveDate,
    },

    /// The offer has no remaining positions.
    #[error("offer {0} has no remaining positions")]
    OfferFull(OfferId),

    /// A status of one entity kind was applied to another kind.
    #[error("cannot apply a {found} status to a {expected}")]
    StatusKindMismatch {
        /// Kind of the entity being changed.
        expected: EntityKind,
        /// Kind the status belongs to.
        found: EntityKind,
    },

    /// The student already has an open application for this offer.
    #[error("student {student_id} already has an open application for offer {offer_id}")]
    DuplicateApplication {
        /// Applying student.
        student_id: UserId,
        /// Target offer.
        offer_id: OfferId,
    },
}

/// Error returned while parsing a status name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} status: {value}")]
pub struct ParseStatusError {
    /// Entity kind whose status space was searched.
    pub kind: EntityKind,
    /// Rejected input.
    pub value: String,
}

impl ParseStatusError {
    /// Creates a parse error for the given kind and input.
    #[must_use]
    pub fn new(kind: EntityKind, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Error returned while parsing an actor role.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown actor role: {0}")]
pub struct ParseRoleError(pub String);

/// Error returned while parsing a notification kind from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown notification kind: {0}")]
pub struct ParseNotificationKindError(pub String);
