//! Internship offers published by hospitals.

use super::{OfferId, PlacementDomainError, Revision, UserId};
use chrono::NaiveDate;
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Parameters for publishing a new offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOffer {
    /// Publishing hospital.
    pub hospital_id: UserId,
    /// Doctor supervising the resulting internships.
    pub supervisor_id: UserId,
    /// Human-readable title.
    pub title: String,
    /// First day of the placement.
    pub start_date: NaiveDate,
    /// Last day of the placement.
    pub end_date: NaiveDate,
    /// Number of students that can be accepted.
    pub positions: u32,
}

/// An offer students apply to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    id: OfferId,
    hospital_id: UserId,
    supervisor_id: UserId,
    title: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    positions: u32,
    filled_positions: u32,
    revision: Revision,
}

/// Parameter object for reconstructing a persisted offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOfferData {
    /// Offer identifier.
    pub id: OfferId,
    /// Publishing hospital.
    pub hospital_id: UserId,
    /// Supervising doctor.
    pub supervisor_id: UserId,
    /// Title.
    pub title: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Total positions.
    pub positions: u32,
    /// Positions already consumed by accepted applications.
    pub filled_positions: u32,
    /// Version and timestamps.
    pub revision: Revision,
}

impl Offer {
    /// Validates and creates a new offer.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementDomainError`] when the title is blank, the dates are
    /// not ordered, or no position is offered.
    pub fn publish(new_offer: NewOffer, clock: &impl Clock) -> Result<Self, PlacementDomainError> {
        let title = new_offer.title.trim();
        if title.is_empty() {
            return Err(PlacementDomainError::EmptyTitle);
        }
        if new_offer.start_date >= new_offer.end_date {
            return Err(PlacementDomainError::InvalidDateRange {
                start: new_offer.start_date,
                end: new_offer.end_date,
            });
        }
        if new_offer.positions == 0 {
            return Err(PlacementDomainError::InvalidPositions(new_offer.positions));
        }

        Ok(Self {
            id: OfferId::new(),
            hospital_id: new_offer.hospital_id,
            supervisor_id: new_offer.supervisor_id,
            title: title.to_owned(),
            start_date: new_offer.start_date,
            end_date: new_offer.end_date,
            positions: new_offer.positions,
            filled_positions: 0,
            revision: Revision::initial(clock),
        })
    }

    /// Reconstructs an offer from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOfferData) -> Self {
        Self {
            id: data.id,
            hospital_id: data.hospital_id,
            supervisor_id: data.supervisor_id,
            title: data.title,
            start_date: data.start_date,
            end_date: data.end_date,
            positions: data.positions,
            filled_positions: data.filled_positions,
            revision: data.revision,
        }
    }

    /// Returns the offer identifier.
    #[must_use]
    pub const fn id(&self) -> OfferId {
        self.id
    }

    /// Returns the publishing hospital.
    #[must_use]
    pub const fn hospital_id(&self) -> UserId {
        self.hospital_id
    }

    /// Returns the supervising doctor.
    #[must_use]
    pub const fn supervisor_id(&self) -> UserId {
        self.supervisor_id
    }

    /// Returns the offer title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
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

    /// Returns the total number of positions.
    #[must_use]
    pub const fn positions(&self) -> u32 {
        self.positions
    }

    /// Returns the number of consumed positions.
    #[must_use]
    pub const fn filled_positions(&self) -> u32 {
        self.filled_positions
    }

    /// Returns the number of positions still available.
    #[must_use]
    pub const fn remaining_positions(&self) -> u32 {
        self.positions.saturating_sub(self.filled_positions)
    }

    /// Returns the version and timestamps.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Consumes one position for an accepted application.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementDomainError::OfferFull`] when no position remains.
    pub fn fill_position(&mut self, clock: &impl Clock) -> Result<(), PlacementDomainError> {
        if self.remaining_positions() == 0 {
            return Err(PlacementDomainError::OfferFull(self.id));
        }
        self.filled_positions += 1;
        self.revision.bump(clock);
        Ok(())
    }
}
