//! Student applications to internship offers.

use super::{ApplicationId, ApplicationStatus, OfferId, Revision, UserId};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Application aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    id: ApplicationId,
    student_id: UserId,
    offer_id: OfferId,
    status: ApplicationStatus,
    rejection_reason: Option<String>,
    revision: Revision,
}

/// Parameter object for reconstructing a persisted application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedApplicationData {
    /// Application identifier.
    pub id: ApplicationId,
    /// Applying student.
    pub student_id: UserId,
    /// Target offer.
    pub offer_id: OfferId,
    /// Review status.
    pub status: ApplicationStatus,
    /// Reason recorded on rejection.
    pub rejection_reason: Option<String>,
    /// Version and timestamps.
    pub revision: Revision,
}

impl Application {
    /// Creates a pending application.
    #[must_use]
    pub fn submit(student_id: UserId, offer_id: OfferId, clock: &impl Clock) -> Self {
        Self {
            id: ApplicationId::new(),
            student_id,
            offer_id,
            status: ApplicationStatus::Pending,
            rejection_reason: None,
            revision: Revision::initial(clock),
        }
    }

    /// Reconstructs an application from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedApplicationData) -> Self {
        Self {
            id: data.id,
            student_id: data.student_id,
            offer_id: data.offer_id,
            status: data.status,
            rejection_reason: data.rejection_reason,
            revision: data.revision,
        }
    }

    /// Returns the application identifier.
    #[must_use]
    pub const fn id(&self) -> ApplicationId {
        self.id
    }

    /// Returns the applying student.
    #[must_use]
    pub const fn student_id(&self) -> UserId {
        self.student_id
    }

    /// Returns the target offer.
    #[must_use]
    pub const fn offer_id(&self) -> OfferId {
        self.offer_id
    }

    /// Returns the review status.
    #[must_use]
    pub const fn status(&self) -> ApplicationStatus {
        self.status
    }

    /// Returns the rejection reason, if any.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Returns the version and timestamps.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Returns `true` while the application can still be decided.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub(crate) fn set_status(
        &mut self,
        status: ApplicationStatus,
        note: Option<String>,
        clock: &impl Clock,
    ) {
        self.status = status;
        if status == ApplicationStatus::Rejected {
            self.rejection_reason = note;
        }
        self.revision.bump(clock);
    }
}
