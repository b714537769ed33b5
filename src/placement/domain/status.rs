//! Status state spaces for every placement entity.

use super::ParseStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity governed by the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Student application to an offer.
    Application,
    /// Internship placement.
    Internship,
    /// Logbook entry written during an internship.
    LogbookEntry,
    /// Attendance record for one internship day.
    Attendance,
    /// Evaluation of the student by a doctor or tutor.
    Evaluation,
}

impl EntityKind {
    /// All entity kinds, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Application,
        Self::Internship,
        Self::LogbookEntry,
        Self::Attendance,
        Self::Evaluation,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Internship => "internship",
            Self::LogbookEntry => "logbook_entry",
            Self::Attendance => "attendance",
            Self::Evaluation => "evaluation",
        }
    }

    /// Returns every status of this entity kind.
    #[must_use]
    pub fn statuses(self) -> Vec<Status> {
        match self {
            Self::Application => ApplicationStatus::ALL
                .iter()
                .copied()
                .map(Status::Application)
                .collect(),
            Self::Internship => InternshipStatus::ALL
                .iter()
                .copied()
                .map(Status::Internship)
                .collect(),
            Self::LogbookEntry => LogbookStatus::ALL
                .iter()
                .copied()
                .map(Status::LogbookEntry)
                .collect(),
            Self::Attendance => AttendanceStatus::ALL
                .iter()
                .copied()
                .map(Status::Attendance)
                .collect(),
            Self::Evaluation => EvaluationStatus::ALL
                .iter()
                .copied()
                .map(Status::Evaluation)
                .collect(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:expr) {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
        terminal [$($terminal:ident),+ $(,)?]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every status, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the canonical storage representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// Returns `true` when the status has no valid outbound transition.
            #[must_use]
            pub const fn is_terminal(self) -> bool {
                matches!(self, $(Self::$terminal)|+)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ParseStatusError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                let normalized = value.trim().to_ascii_lowercase();
                match normalized.as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError::new($kind, value)),
                }
            }
        }
    };
}

status_enum! {
    /// Application review status.
    ApplicationStatus (EntityKind::Application) {
        /// Submitted and waiting for a reviewer.
        Pending => "pending",
        /// Picked up by a hospital or doctor reviewer.
        Reviewing => "reviewing",
        /// Accepted; an internship exists for it.
        Accepted => "accepted",
        /// Rejected by a reviewer or by capacity exhaustion.
        Rejected => "rejected",
        /// Withdrawn by the owning student.
        Withdrawn => "withdrawn",
    }
    terminal [Accepted, Rejected, Withdrawn]
}

status_enum! {
    /// Internship placement status.
    InternshipStatus (EntityKind::Internship) {
        /// Accepted but not yet started.
        Upcoming => "upcoming",
        /// Between its start and end dates.
        Active => "active",
        /// Past its end date.
        Completed => "completed",
        /// Cancelled by an administrator.
        Cancelled => "cancelled",
    }
    terminal [Completed, Cancelled]
}

status_enum! {
    /// Logbook entry review status.
    LogbookStatus (EntityKind::LogbookEntry) {
        /// Being written by the student.
        Draft => "draft",
        /// Submitted for supervisor review.
        Pending => "pending",
        /// Approved by the supervising doctor.
        Approved => "approved",
        /// Sent back to the student with comments.
        RevisionRequested => "revision_requested",
        /// Closed because the internship was cancelled.
        Cancelled => "cancelled",
    }
    terminal [Approved, Cancelled]
}

status_enum! {
    /// Attendance record status.
    AttendanceStatus (EntityKind::Attendance) {
        /// Recorded without a presence claim.
        Pending => "pending",
        /// Student reported presence.
        Present => "present",
        /// Student reported absence.
        Absent => "absent",
        /// Student reported late arrival.
        Late => "late",
        /// Student reported an excused absence.
        Excused => "excused",
        /// Validated by the supervising doctor.
        Approved => "approved",
        /// Refused by the supervising doctor.
        Rejected => "rejected",
    }
    terminal [Approved, Rejected]
}

impl AttendanceStatus {
    /// Returns `true` for statuses a student may record initially.
    #[must_use]
    pub const fn is_recordable(self) -> bool {
        !self.is_terminal()
    }
}

status_enum! {
    /// Evaluation status.
    EvaluationStatus (EntityKind::Evaluation) {
        /// Being written by the evaluator.
        Draft => "draft",
        /// Submitted to the student.
        Submitted => "submitted",
        /// Acknowledged by the evaluated student.
        Acknowledged => "acknowledged",
        /// Closed because the internship was cancelled.
        Cancelled => "cancelled",
    }
    terminal [Acknowledged, Cancelled]
}

/// Evaluation cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvaluationType {
    /// Half-way evaluation.
    #[serde(rename = "mid-term")]
    MidTerm,
    /// End-of-internship evaluation.
    #[serde(rename = "final")]
    Final,
    /// Monthly progress evaluation.
    #[serde(rename = "monthly")]
    Monthly,
}

impl EvaluationType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MidTerm => "mid-term",
            Self::Final => "final",
            Self::Monthly => "monthly",
        }
    }
}

impl TryFrom<&str> for EvaluationType {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mid-term" | "midterm" | "mid_term" => Ok(Self::MidTerm),
            "final" => Ok(Self::Final),
            "monthly" => Ok(Self::Monthly),
            _ => Err(ParseStatusError::new(EntityKind::Evaluation, value)),
        }
    }
}

/// Status of any engine entity, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "entity", content = "status", rename_all = "snake_case")]
pub enum Status {
    /// Application status.
    Application(ApplicationStatus),
    /// Internship status.
    Internship(InternshipStatus),
    /// Logbook entry status.
    LogbookEntry(LogbookStatus),
    /// Attendance status.
    Attendance(AttendanceStatus),
    /// Evaluation status.
    Evaluation(EvaluationStatus),
}

impl Status {
    /// Parses a status name for the given entity kind.
    ///
    /// # Errors
    ///
    /// Returns [`ParseStatusError`] when the name is not a status of `kind`.
    pub fn parse(kind: EntityKind, value: &str) -> Result<Self, ParseStatusError> {
        Ok(match kind {
            EntityKind::Application => Self::Application(ApplicationStatus::try_from(value)?),
            EntityKind::Internship => Self::Internship(InternshipStatus::try_from(value)?),
            EntityKind::LogbookEntry => Self::LogbookEntry(LogbookStatus::try_from(value)?),
            EntityKind::Attendance => Self::Attendance(AttendanceStatus::try_from(value)?),
            EntityKind::Evaluation => Self::Evaluation(EvaluationStatus::try_from(value)?),
        })
    }

    /// Returns the entity kind this status belongs to.
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

    /// Returns `true` when the status has no valid outbound transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        match self {
            Self::Application(status) => status.is_terminal(),
            Self::Internship(status) => status.is_terminal(),
            Self::LogbookEntry(status) => status.is_terminal(),
            Self::Attendance(status) => status.is_terminal(),
            Self::Evaluation(status) => status.is_terminal(),
        }
    }

    /// Returns the canonical storage representation of the inner status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Application(status) => status.as_str(),
            Self::Internship(status) => status.as_str(),
            Self::LogbookEntry(status) => status.as_str(),
            Self::Attendance(status) => status.as_str(),
            Self::Evaluation(status) => status.as_str(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.as_str())
    }
}

impl From<ApplicationStatus> for Status {
    fn from(value: ApplicationStatus) -> Self {
        Self::Application(value)
    }
}

impl From<InternshipStatus> for Status {
    fn from(value: InternshipStatus) -> Self {
        Self::Internship(value)
    }
}

impl From<LogbookStatus> for Status {
    fn from(value: LogbookStatus) -> Self {
        Self::LogbookEntry(value)
    }
}

impl From<AttendanceStatus> for Status {
    fn from(value: AttendanceStatus) -> Self {
        Self::Attendance(value)
    }
}

impl From<EvaluationStatus> for Status {
    fn from(value: EvaluationStatus) -> Self {
        Self::Evaluation(value)
    }
}
