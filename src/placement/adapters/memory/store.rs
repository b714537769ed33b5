//! In-memory entity store for workflow tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::placement::{
    domain::{
        Application, ChangeSet, Entity, EntityRef, EntityWrite, Internship, InternshipId,
        InternshipStatus, Notification, NotificationId, Offer, OfferId, OfferWrite, UserId,
    },
    ports::{PlacementStore, StoreError, StoreResult},
};

/// Thread-safe in-memory placement store.
///
/// Commits check every version under a single write guard before applying
/// anything, so a failed commit never leaves partial state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlacementStore {
    state: Arc<RwLock<InMemoryPlacementState>>,
    injected_failures: Arc<AtomicUsize>,
}

#[derive(Debug, Default)]
struct InMemoryPlacementState {
    offers: HashMap<OfferId, Offer>,
    entities: HashMap<EntityRef, Entity>,
    outbox: Vec<Notification>,
}

impl InMemoryPlacementStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` commits fail with a persistence error.
    pub fn fail_next_commits(&self, count: usize) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    /// Returns every stored internship, in start-date order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the state lock is poisoned.
    pub fn internships(&self) -> StoreResult<Vec<Internship>> {
        let state = self.read()?;
        let mut internships: Vec<Internship> = state
            .entities
            .values()
            .filter_map(Entity::as_internship)
            .cloned()
            .collect();
        internships.sort_by_key(|internship| (internship.start_date(), internship.id()));
        Ok(internships)
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, InMemoryPlacementState>> {
        self.state
            .read()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, InMemoryPlacementState>> {
        self.state
            .write()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn take_injected_failure(&self) -> bool {
        self.injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }

    fn select_internships(
        &self,
        status: InternshipStatus,
        due: impl Fn(&Internship) -> bool,
    ) -> StoreResult<Vec<Internship>> {
        Ok(self
            .internships()?
            .into_iter()
            .filter(|internship| internship.status() == status && due(internship))
            .collect())
    }
}

fn check_entity_write(state: &InMemoryPlacementState, write: &EntityWrite) -> StoreResult<()> {
    let entity_ref = write.entity().entity_ref();
    match write {
        EntityWrite::Insert(_) if state.entities.contains_key(&entity_ref) => {
            Err(StoreError::Duplicate(entity_ref.to_string()))
        }
        EntityWrite::Insert(_) => Ok(()),
        EntityWrite::Update {
            expected_version, ..
        } => {
            let stored = state
                .entities
                .get(&entity_ref)
                .ok_or_else(|| StoreError::NotFound(entity_ref.to_string()))?;
            if stored.version() == *expected_version {
                Ok(())
            } else {
                Err(StoreError::Conflict(entity_ref.to_string()))
            }
        }
    }
}

/// Mirrors the partial unique index on open applications: a student holds
/// at most one pending or reviewing application per offer.
fn check_open_application(
    state: &InMemoryPlacementState,
    change_set: &ChangeSet,
    write: &EntityWrite,
) -> StoreResult<()> {
    let Some(application) = write.entity().as_application().filter(|app| app.is_open()) else {
        return Ok(());
    };
    let same_slot = |other: &Application| {
        other.id() != application.id()
            && other.is_open()
            && other.student_id() == application.student_id()
            && other.offer_id() == application.offer_id()
    };
    let staged = change_set
        .entity_writes()
        .iter()
        .filter_map(|staged| staged.entity().as_application());
    let stored = state
        .entities
        .values()
        .filter_map(Entity::as_application)
        .filter(|stored| change_set.staged(EntityRef::Application(stored.id())).is_none());
    if staged.chain(stored).any(same_slot) {
        Err(StoreError::Duplicate(format!(
            "open application of {} for offer/{}",
            application.student_id(),
            application.offer_id()
        )))
    } else {
        Ok(())
    }
}

fn check_offer_write(state: &InMemoryPlacementState, write: &OfferWrite) -> StoreResult<()> {
    match write {
        OfferWrite::Insert(offer) if state.offers.contains_key(&offer.id()) => {
            Err(StoreError::Duplicate(format!("offer/{}", offer.id())))
        }
        OfferWrite::Insert(_) => Ok(()),
        OfferWrite::Update {
            offer,
            expected_version,
        } => {
            let stored = state
                .offers
                .get(&offer.id())
                .ok_or_else(|| StoreError::NotFound(format!("offer/{}", offer.id())))?;
            if stored.revision().version == *expected_version {
                Ok(())
            } else {
                Err(StoreError::Conflict(format!("offer/{}", offer.id())))
            }
        }
    }
}

#[async_trait]
impl PlacementStore for InMemoryPlacementStore {
    async fn find_entity(&self, entity: EntityRef) -> StoreResult<Option<Entity>> {
        let state = self.read()?;
        Ok(state.entities.get(&entity).cloned())
    }

    async fn find_offer(&self, id: OfferId) -> StoreResult<Option<Offer>> {
        let state = self.read()?;
        Ok(state.offers.get(&id).cloned())
    }

    async fn applications_for_offer(&self, offer_id: OfferId) -> StoreResult<Vec<Application>> {
        let state = self.read()?;
        let mut applications: Vec<Application> = state
            .entities
            .values()
            .filter_map(Entity::as_application)
            .filter(|application| application.offer_id() == offer_id)
            .cloned()
            .collect();
        applications.sort_by_key(|application| (application.revision().created_at, application.id()));
        Ok(applications)
    }

    async fn dependents_of(&self, internship_id: InternshipId) -> StoreResult<Vec<Entity>> {
        let state = self.read()?;
        let mut dependents: Vec<Entity> = state
            .entities
            .values()
            .filter(|entity| {
                entity.as_internship().is_none() && entity.internship_id() == Some(internship_id)
            })
            .cloned()
            .collect();
        dependents.sort_by_key(|entity| (entity.revision().created_at, entity.entity_ref().uuid()));
        Ok(dependents)
    }

    async fn internships_due_to_start(&self, today: NaiveDate) -> StoreResult<Vec<Internship>> {
        self.select_internships(InternshipStatus::Upcoming, |internship| {
            internship.is_due_to_start(today)
        })
    }

    async fn internships_due_to_complete(
        &self,
        today: NaiveDate,
    ) -> StoreResult<Vec<Internship>> {
        self.select_internships(InternshipStatus::Active, |internship| {
            internship.is_due_to_complete(today)
        })
    }

    async fn commit(&self, change_set: &ChangeSet) -> StoreResult<()> {
        if self.take_injected_failure() {
            return Err(StoreError::persistence(std::io::Error::other(
                "injected commit failure",
            )));
        }

        let mut state = self.write()?;
        for write in change_set.entity_writes() {
            check_entity_write(&state, write)?;
            check_open_application(&state, change_set, write)?;
        }
        for write in change_set.offer_writes() {
            check_offer_write(&state, write)?;
        }
        let known: HashSet<NotificationId> = state.outbox.iter().map(|row| row.id).collect();
        if let Some(duplicate) = change_set
            .notifications()
            .iter()
            .find(|notification| known.contains(&notification.id))
        {
            return Err(StoreError::Duplicate(format!("notification/{}", duplicate.id)));
        }

        for write in change_set.entity_writes() {
            let entity = write.entity().clone();
            state.entities.insert(entity.entity_ref(), entity);
        }
        for write in change_set.offer_writes() {
            let offer = match write {
                OfferWrite::Insert(offer) | OfferWrite::Update { offer, .. } => offer.clone(),
            };
            state.offers.insert(offer.id(), offer);
        }
        state
            .outbox
            .extend(change_set.notifications().iter().cloned());
        Ok(())
    }

    async fn undispatched_notifications(&self, limit: usize) -> StoreResult<Vec<Notification>> {
        let state = self.read()?;
        Ok(state
            .outbox
            .iter()
            .filter(|notification| !notification.is_dispatched())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_dispatched(
        &self,
        ids: &[NotificationId],
        dispatched_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut state = self.write()?;
        for notification in &mut state.outbox {
            if ids.contains(&notification.id) && notification.dispatched_at.is_none() {
                notification.dispatched_at = Some(dispatched_at);
            }
        }
        Ok(())
    }

    async fn notifications_for(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        let state = self.read()?;
        Ok(state
            .outbox
            .iter()
            .filter(|notification| notification.recipient_id == recipient)
            .cloned()
            .collect())
    }
}
