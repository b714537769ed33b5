//! Daily attendance records.

use super::{
    AttendanceId, AttendanceStatus, Internship, InternshipId, PlacementDomainError, Revision,
    UserId,
};
use chrono::NaiveDate;
use mockable::Clock;
use serde::{Deserialize, Serialize};

const MAX_DAILY_HOURS: u32 = 24;

/// Attendance aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    id: AttendanceId,
    internship_id: InternshipId,
    student_id: UserId,
    date: NaiveDate,
    hours: u32,
    status: AttendanceStatus,
    revision: Revision,
}

/// Parameter object for reconstructing a persisted attendance record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAttendanceData {
    /// Record identifier.
    pub id: AttendanceId,
    /// Owning internship.
    pub internship_id: InternshipId,
    /// Attending student.
    pub student_id: UserId,
    /// Recorded day.
    pub date: NaiveDate,
    /// Hours claimed for the day.
    pub hours: u32,
    /// Validation status.
    pub status: AttendanceStatus,
    /// Version and timestamps.
    pub revision: Revision,
}

impl Attendance {
    /// Records attendance for the internship's student.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementDomainError`] when the internship is closed, the
    /// date falls outside it, the hours are out of range, or the status is a
    /// validated one.
    pub fn record(
        internship: &Internship,
        date: NaiveDate,
        hours: u32,
        status: AttendanceStatus,
        clock: &impl Clock,
    ) -> Result<Self, PlacementDomainError> {
        internship.ensure_accepts_records(date)?;
        if hours == 0 || hours > MAX_DAILY_HOURS {
            return Err(PlacementDomainError::InvalidHours(hours));
        }
        if !status.is_recordable() {
            return Err(PlacementDomainError::InvalidInitialAttendance(status));
        }

        Ok(Self {
            id: AttendanceId::new(),
            internship_id: internship.id(),
            student_id: internship.student_id(),
            date,
            hours,
            status,
            revision: Revision::initial(clock),
        })
    }

    /// Reconstructs an attendance record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAttendanceData) -> Self {
        Self {
            id: data.id,
            internship_id: data.internship_id,
            student_id: data.student_id,
            date: data.date,
            hours: data.hours,
            status: data.status,
            revision: data.revision,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> AttendanceId {
        self.id
    }

    /// Returns the owning internship.
    #[must_use]
    pub const fn internship_id(&self) -> InternshipId {
        self.internship_id
    }

    /// Returns the attending student.
    #[must_use]
    pub const fn student_id(&self) -> UserId {
        self.student_id
    }

    /// Returns the recorded day.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the claimed hours.
    #[must_use]
    pub const fn hours(&self) -> u32 {
        self.hours
    }

    /// Returns the validation status.
    #[must_use]
    pub const fn status(&self) -> AttendanceStatus {
        self.status
    }

    /// Returns the version and timestamps.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    pub(crate) fn set_status(&mut self, status: AttendanceStatus, clock: &impl Clock) {
        self.status = status;
        self.revision.bump(clock);
    }
}
