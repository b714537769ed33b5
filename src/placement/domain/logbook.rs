//! Logbook entries written by students during an internship.

use super::{
    Internship, InternshipId, LogbookEntryId, LogbookStatus, PlacementDomainError, Revision,
    UserId,
};
use chrono::NaiveDate;
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Logbook entry aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogbookEntry {
    id: LogbookEntryId,
    internship_id: InternshipId,
    student_id: UserId,
    date: NaiveDate,
    activities: String,
    status: LogbookStatus,
    supervisor_comments: Option<String>,
    revision: Revision,
}

/// Parameter object for reconstructing a persisted logbook entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedLogbookEntryData {
    /// Entry identifier.
    pub id: LogbookEntryId,
    /// Owning internship.
    pub internship_id: InternshipId,
    /// Writing student.
    pub student_id: UserId,
    /// Day the entry covers.
    pub date: NaiveDate,
    /// Free-text activity summary.
    pub activities: String,
    /// Review status.
    pub status: LogbookStatus,
    /// Latest supervisor comment.
    pub supervisor_comments: Option<String>,
    /// Version and timestamps.
    pub revision: Revision,
}

impl LogbookEntry {
    /// Creates a draft entry for the internship's student.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementDomainError`] when the internship is closed or the
    /// date falls outside it.
    pub fn draft(
        internship: &Internship,
        date: NaiveDate,
        activities: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, PlacementDomainError> {
        internship.ensure_accepts_records(date)?;
        Ok(Self {
            id: LogbookEntryId::new(),
            internship_id: internship.id(),
            student_id: internship.student_id(),
            date,
            activities: activities.into(),
            status: LogbookStatus::Draft,
            supervisor_comments: None,
            revision: Revision::initial(clock),
        })
    }

    /// Reconstructs an entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedLogbookEntryData) -> Self {
        Self {
            id: data.id,
            internship_id: data.internship_id,
            student_id: data.student_id,
            date: data.date,
            activities: data.activities,
            status: data.status,
            supervisor_comments: data.supervisor_comments,
            revision: data.revision,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> LogbookEntryId {
        self.id
    }

    /// Returns the owning internship.
    #[must_use]
    pub const fn internship_id(&self) -> InternshipId {
        self.internship_id
    }

    /// Returns the writing student.
    #[must_use]
    pub const fn student_id(&self) -> UserId {
        self.student_id
    }

    /// Returns the covered day.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the activity summary.
    #[must_use]
    pub fn activities(&self) -> &str {
        &self.activities
    }

    /// Returns the review status.
    #[must_use]
    pub const fn status(&self) -> LogbookStatus {
        self.status
    }

    /// Returns the latest supervisor comment.
    #[must_use]
    pub fn supervisor_comments(&self) -> Option<&str> {
        self.supervisor_comments.as_deref()
    }

    /// Returns the version and timestamps.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    pub(crate) fn set_status(
        &mut self,
        status: LogbookStatus,
        note: Option<String>,
        clock: &impl Clock,
    ) {
        self.status = status;
        if matches!(
            status,
            LogbookStatus::Approved | LogbookStatus::RevisionRequested
        ) {
            self.supervisor_comments = note;
        }
        self.revision.bump(clock);
    }
}
