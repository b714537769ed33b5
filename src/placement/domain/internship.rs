//! Internship placements created from accepted applications.

use super::{
    Application, ApplicationId, InternshipId, InternshipStatus, Offer, PlacementDomainError,
    Revision, UserId,
};
use chrono::NaiveDate;
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Internship aggregate.
///
/// `end_date` is the last day of the placement: the internship is due to
/// start once `start_date <= today` and due to complete once
/// `end_date < today`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Internship {
    id: InternshipId,
    application_id: ApplicationId,
    student_id: UserId,
    hospital_id: UserId,
    supervisor_id: UserId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: InternshipStatus,
    credited_hours: u32,
    revision: Revision,
}

/// Parameter object for reconstructing a persisted internship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedInternshipData {
    /// Internship identifier.
    pub id: InternshipId,
    /// Application the internship was created from.
    pub application_id: ApplicationId,
    /// Placed student.
    pub student_id: UserId,
    /// Host hospital.
    pub hospital_id: UserId,
    /// Supervising doctor.
    pub supervisor_id: UserId,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Placement status.
    pub status: InternshipStatus,
    /// Hours credited from approved attendance.
    pub credited_hours: u32,
    /// Version and timestamps.
    pub revision: Revision,
}

impl Internship {
    /// Creates an upcoming internship for an accepted application.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementDomainError::InvalidDateRange`] when the offer dates
    /// are not ordered.
    pub fn from_acceptance(
        application: &Application,
        offer: &Offer,
        clock: &impl Clock,
    ) -> Result<Self, PlacementDomainError> {
        if offer.start_date() >= offer.end_date() {
            return Err(PlacementDomainError::InvalidDateRange {
                start: offer.start_date(),
                end: offer.end_date(),
            });
        }

        Ok(Self {
            id: InternshipId::new(),
            application_id: application.id(),
            student_id: application.student_id(),
            hospital_id: offer.hospital_id(),
            supervisor_id: offer.supervisor_id(),
            start_date: offer.start_date(),
            end_date: offer.end_date(),
            status: InternshipStatus::Upcoming,
            credited_hours: 0,
            revision: Revision::initial(clock),
        })
    }

    /// Reconstructs an internship from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedInternshipData) -> Self {
        Self {
            id: data.id,
            application_id: data.application_id,
            student_id: data.student_id,
            hospital_id: data.hospital_id,
            supervisor_id: data.supervisor_id,
            start_date: data.start_date,
            end_date: data.end_date,
            status: data.status,
            credited_hours: data.credited_hours,
            revision: data.revision,
        }
    }

    /// Returns the internship identifier.
    #[must_use]
    pub const fn id(&self) -> InternshipId {
        self.id
    }

    /// Returns the originating application.
    #[must_use]
    pub const fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    /// Returns the placed student.
    #[must_use]
    pub const fn student_id(&self) -> UserId {
        self.student_id
    }

    /// Returns the host hospital.
    #[must_use]
    pub const fn hospital_id(&self) -> UserId {
        self.hospital_id
    }

    /// Returns the supervising doctor.
    #[must_use]
    pub const fn supervisor_id(&self) -> UserId {
        self.supervisor_id
    }

    /// Returns the first placement day.
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Returns the last placement day.
    #[must_use]
    pub const fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Returns the placement status.
    #[must_use]
    pub const fn status(&self) -> InternshipStatus {
        self.status
    }

    /// Returns the hours credited from approved attendance.
    #[must_use]
    pub const fn credited_hours(&self) -> u32 {
        self.credited_hours
    }

    /// Returns the version and timestamps.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Returns `true` while dependents may still be recorded.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Returns `true` when `date` falls within the placement period.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Returns `true` when the internship should have started by `today`.
    #[must_use]
    pub fn is_due_to_start(&self, today: NaiveDate) -> bool {
        self.start_date <= today
    }

    /// Returns `true` when the internship should have completed by `today`.
    #[must_use]
    pub fn is_due_to_complete(&self, today: NaiveDate) -> bool {
        self.end_date < today
    }

    /// Ensures dependents can be attached for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementDomainError::InternshipClosed`] for terminal
    /// internships and [`PlacementDomainError::OutsideInternship`] when the
    /// date is outside the placement period.
    pub fn ensure_accepts_records(&self, date: NaiveDate) -> Result<(), PlacementDomainError> {
        if !self.is_open() {
            return Err(PlacementDomainError::InternshipClosed {
                internship_id: self.id,
                status: self.status,
            });
        }
        if !self.covers(date) {
            return Err(PlacementDomainError::OutsideInternship {
                internship_id: self.id,
                date,
            });
        }
        Ok(())
    }

    pub(crate) fn set_status(&mut self, status: InternshipStatus, clock: &impl Clock) {
        self.status = status;
        self.revision.bump(clock);
    }

    /// Bumps the revision without changing any field, so a change planned
    /// against the previous version of the internship conflicts.
    pub(crate) fn touch(&mut self, clock: &impl Clock) {
        self.revision.bump(clock);
    }

    pub(crate) fn credit_hours(&mut self, hours: u32, clock: &impl Clock) {
        self.credited_hours = self.credited_hours.saturating_add(hours);
        self.revision.bump(clock);
    }
}
