//! Unit of work committed atomically by the entity store.

use super::{Entity, EntityRef, Internship, Notification, Offer, OfferId};
use mockable::Clock;

/// A write to a workflow entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityWrite {
    /// Inserts a new entity.
    Insert(Entity),
    /// Replaces an entity whose stored version must still be
    /// `expected_version`.
    Update {
        /// Entity state to persist.
        entity: Entity,
        /// Version observed when the change was planned.
        expected_version: u64,
    },
}

impl EntityWrite {
    /// Returns the written entity.
    #[must_use]
    pub const fn entity(&self) -> &Entity {
        match self {
            Self::Insert(entity) | Self::Update { entity, .. } => entity,
        }
    }
}

/// A write to an offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferWrite {
    /// Inserts a new offer.
    Insert(Offer),
    /// Replaces an offer whose stored version must still be
    /// `expected_version`.
    Update {
        /// Offer state to persist.
        offer: Offer,
        /// Version observed when the change was planned.
        expected_version: u64,
    },
}

/// Entity writes, offer writes, and outbox notifications that commit together
/// or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    entity_writes: Vec<EntityWrite>,
    offer_writes: Vec<OfferWrite>,
    notifications: Vec<Notification>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a new entity.
    pub fn insert(&mut self, entity: impl Into<Entity>) {
        self.entity_writes.push(EntityWrite::Insert(entity.into()));
    }

    /// Stages an updated entity, guarded by the version it was read at.
    pub fn update(&mut self, entity: impl Into<Entity>, expected_version: u64) {
        self.entity_writes.push(EntityWrite::Update {
            entity: entity.into(),
            expected_version,
        });
    }

    /// Stages a new logbook entry, attendance record, or evaluation of
    /// `internship`.
    ///
    /// The internship is written back one version up, guarded by the version
    /// it was read at, so the insert and a concurrent close of the internship
    /// cannot both commit.
    pub fn insert_dependent(
        &mut self,
        dependent: impl Into<Entity>,
        internship: &Internship,
        clock: &impl Clock,
    ) {
        let mut parent = internship.clone();
        let expected_version = parent.revision().version;
        parent.touch(clock);
        self.update(parent, expected_version);
        self.insert(dependent);
    }

    /// Stages a new offer.
    pub fn insert_offer(&mut self, offer: Offer) {
        self.offer_writes.push(OfferWrite::Insert(offer));
    }

    /// Stages an updated offer, guarded by the version it was read at.
    pub fn update_offer(&mut self, offer: Offer, expected_version: u64) {
        self.offer_writes.push(OfferWrite::Update {
            offer,
            expected_version,
        });
    }

    /// Stages an outbox notification.
    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Returns the staged entity writes in staging order.
    #[must_use]
    pub fn entity_writes(&self) -> &[EntityWrite] {
        &self.entity_writes
    }

    /// Returns the staged offer writes in staging order.
    #[must_use]
    pub fn offer_writes(&self) -> &[OfferWrite] {
        &self.offer_writes
    }

    /// Returns the staged notifications in staging order.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Returns the staged state of an entity, if the change set writes it.
    #[must_use]
    pub fn staged(&self, entity_ref: EntityRef) -> Option<&Entity> {
        self.entity_writes
            .iter()
            .rev()
            .map(EntityWrite::entity)
            .find(|entity| entity.entity_ref() == entity_ref)
    }

    /// Returns the staged state of an offer, if the change set writes it.
    #[must_use]
    pub fn staged_offer(&self, offer_id: OfferId) -> Option<&Offer> {
        self.offer_writes
            .iter()
            .rev()
            .map(|write| match write {
                OfferWrite::Insert(offer) | OfferWrite::Update { offer, .. } => offer,
            })
            .find(|offer| offer.id() == offer_id)
    }

    /// Returns `true` when nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity_writes.is_empty()
            && self.offer_writes.is_empty()
            && self.notifications.is_empty()
    }
}
