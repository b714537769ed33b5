//! Entity store port: lookups, sweep selections, and atomic commits.

use crate::placement::domain::{
    Application, ChangeSet, Entity, EntityRef, EntitySnapshot, Internship, InternshipId,
    Notification, NotificationId, Offer, OfferId, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for entity store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Placement persistence contract.
#[async_trait]
pub trait PlacementStore: Send + Sync {
    /// Finds an entity by reference.
    ///
    /// Returns `None` when the entity does not exist.
    async fn find_entity(&self, entity: EntityRef) -> StoreResult<Option<Entity>>;

    /// Finds an offer by identifier.
    async fn find_offer(&self, id: OfferId) -> StoreResult<Option<Offer>>;

    /// Returns every application to the offer, whatever its status.
    async fn applications_for_offer(&self, offer_id: OfferId) -> StoreResult<Vec<Application>>;

    /// Returns every logbook entry, attendance record, and evaluation of the
    /// internship.
    async fn dependents_of(&self, internship_id: InternshipId) -> StoreResult<Vec<Entity>>;

    /// Returns upcoming internships whose start date is on or before `today`.
    async fn internships_due_to_start(&self, today: NaiveDate) -> StoreResult<Vec<Internship>>;

    /// Returns active internships whose end date is before `today`.
    async fn internships_due_to_complete(&self, today: NaiveDate)
    -> StoreResult<Vec<Internship>>;

    /// Applies every write and notification of the change set, or none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when any updated record no longer
    /// has its expected version, [`StoreError::NotFound`] when an updated
    /// record is missing, [`StoreError::Duplicate`] when an inserted record
    /// already exists or a student would hold two open applications to one
    /// offer, and [`StoreError::Persistence`] for backend failures.
    /// The store is unchanged whenever an error is returned.
    async fn commit(&self, change_set: &ChangeSet) -> StoreResult<()>;

    /// Returns up to `limit` outbox notifications not yet handed to the
    /// notification service, oldest first.
    async fn undispatched_notifications(&self, limit: usize) -> StoreResult<Vec<Notification>>;

    /// Marks outbox notifications as handed to the notification service.
    async fn mark_dispatched(
        &self,
        ids: &[NotificationId],
        dispatched_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Returns every outbox notification addressed to `recipient`, oldest
    /// first.
    async fn notifications_for(&self, recipient: UserId) -> StoreResult<Vec<Notification>>;

    /// Finds an internship by identifier.
    async fn find_internship(&self, id: InternshipId) -> StoreResult<Option<Internship>> {
        let entity = self.find_entity(EntityRef::Internship(id)).await?;
        Ok(entity.and_then(|found| match found {
            Entity::Internship(internship) => Some(internship),
            _ => None,
        }))
    }

    /// Loads an entity together with the supervising doctor of its
    /// internship, or the publishing hospital of an application's offer.
    async fn snapshot(&self, entity: EntityRef) -> StoreResult<Option<EntitySnapshot>> {
        let Some(found) = self.find_entity(entity).await? else {
            return Ok(None);
        };
        let offer_hospital_id = match found.as_application() {
            Some(application) => self
                .find_offer(application.offer_id())
                .await?
                .map(|offer| offer.hospital_id()),
            None => None,
        };
        let supervisor_id = match &found {
            Entity::Application(_) => None,
            Entity::Internship(internship) => Some(internship.supervisor_id()),
            Entity::LogbookEntry(_) | Entity::Attendance(_) | Entity::Evaluation(_) => {
                match found.internship_id() {
                    Some(internship_id) => self
                        .find_internship(internship_id)
                        .await?
                        .map(|internship| internship.supervisor_id()),
                    None => None,
                }
            }
        };
        let snapshot = EntitySnapshot::new(found, supervisor_id);
        Ok(Some(match offer_hospital_id {
            Some(hospital_id) => snapshot.with_offer_hospital(hospital_id),
            None => snapshot,
        }))
    }
}

/// Errors returned by entity store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// An updated record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// An updated record no longer has the expected version.
    #[error("version conflict on {0}")]
    Conflict(String),

    /// An inserted record already exists.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns `true` for failures worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}
