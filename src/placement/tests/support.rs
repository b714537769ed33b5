//! Shared fixtures for placement unit tests.

use crate::placement::{
    adapters::{
        clock::ManualClock,
        memory::{InMemoryPlacementStore, RecordingNotificationQueue},
    },
    domain::{
        Actor, Application, ApplicationStatus, ChangeSet, Entity, EntityRef, Internship,
        InternshipId, NewOffer, Notification, NotificationId, Offer, OfferId, Role, Status,
        UserId,
    },
    ports::{PlacementStore, StoreResult},
    services::{SideEffect, TransitionResult, WorkflowResult, WorkflowService},
    validation::TransitionRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rstest::fixture;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

pub type TestService =
    WorkflowService<InMemoryPlacementStore, RecordingNotificationQueue, ManualClock>;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Day the harness clock starts on.
pub fn today() -> NaiveDate {
    date(2026, 3, 1)
}

pub fn offer_start() -> NaiveDate {
    date(2026, 4, 1)
}

pub fn offer_end() -> NaiveDate {
    date(2026, 6, 30)
}

pub fn student() -> Actor {
    Actor::new(UserId::new(), Role::Student)
}

/// An in-memory engine with one hospital, one supervising doctor, and one
/// administrator.
pub struct Harness {
    pub store: Arc<InMemoryPlacementStore>,
    pub queue: Arc<RecordingNotificationQueue>,
    pub clock: ManualClock,
    pub service: TestService,
    pub hospital: Actor,
    pub doctor: Actor,
    pub admin: Actor,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryPlacementStore::new());
        let queue = Arc::new(RecordingNotificationQueue::new());
        let clock = ManualClock::on(today());
        let service = WorkflowService::new(
            Arc::clone(&store),
            Arc::clone(&queue),
            Arc::new(clock.clone()),
        )
        .with_retry_backoff(Duration::ZERO);
        Self {
            store,
            queue,
            clock,
            service,
            hospital: Actor::new(UserId::new(), Role::Hospital),
            doctor: Actor::new(UserId::new(), Role::Doctor),
            admin: Actor::new(UserId::new(), Role::Admin),
        }
    }

    pub fn new_offer(&self, positions: u32) -> NewOffer {
        NewOffer {
            hospital_id: self.hospital.id,
            supervisor_id: self.doctor.id,
            title: "Internal medicine rotation".to_owned(),
            start_date: offer_start(),
            end_date: offer_end(),
            positions,
        }
    }

    pub async fn offer(&self, positions: u32) -> Offer {
        self.service
            .open_offer(self.hospital, self.new_offer(positions))
            .await
            .expect("offer should be published")
    }

    pub async fn apply(&self, student: Actor, offer: &Offer) -> Application {
        self.service
            .submit_application(student, offer.id())
            .await
            .expect("application should be submitted")
    }

    pub async fn request(
        &self,
        entity: EntityRef,
        to: Status,
        actor: Actor,
    ) -> WorkflowResult<TransitionResult> {
        self.service
            .request_transition(TransitionRequest::new(entity, to, actor))
            .await
    }

    pub async fn review(&self, application: &Application) {
        self.request(
            EntityRef::Application(application.id()),
            Status::Application(ApplicationStatus::Reviewing),
            self.hospital,
        )
        .await
        .expect("review should start");
    }

    pub async fn accept(&self, application: &Application) -> WorkflowResult<TransitionResult> {
        self.request(
            EntityRef::Application(application.id()),
            Status::Application(ApplicationStatus::Accepted),
            self.hospital,
        )
        .await
    }

    /// Publishes an offer, applies, reviews and accepts, returning the new
    /// internship.
    pub async fn placed(&self, student: Actor) -> Internship {
        let offer = self.offer(2).await;
        self.placed_on(student, &offer).await
    }

    /// Applies, reviews and accepts `student` on an existing offer.
    pub async fn placed_on(&self, student: Actor, offer: &Offer) -> Internship {
        let application = self.apply(student, offer).await;
        self.review(&application).await;
        let result = self
            .accept(&application)
            .await
            .expect("acceptance should commit");
        let internship_id = created_internship(&result.side_effects)
            .expect("acceptance should create an internship");
        self.internship(internship_id).await
    }

    pub async fn internship(&self, internship_id: InternshipId) -> Internship {
        self.store
            .find_internship(internship_id)
            .await
            .expect("lookup should succeed")
            .expect("internship should exist")
    }

    pub async fn entity_status(&self, entity: EntityRef) -> Status {
        self.store
            .find_entity(entity)
            .await
            .expect("lookup should succeed")
            .expect("entity should exist")
            .status()
    }
}

#[fixture]
pub fn harness() -> Harness {
    Harness::new()
}

pub fn created_internship(side_effects: &[SideEffect]) -> Option<InternshipId> {
    side_effects.iter().find_map(|effect| match effect {
        SideEffect::InternshipCreated { internship_id } => Some(*internship_id),
        _ => None,
    })
}

/// Store that holds its first `held` commits at a barrier until all of them
/// have arrived, so every racing writer has finished reading before any of
/// them commits.
pub struct GatedStore {
    inner: InMemoryPlacementStore,
    barrier: Barrier,
    held: AtomicUsize,
}

impl GatedStore {
    pub fn new(inner: InMemoryPlacementStore, held: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(held),
            held: AtomicUsize::new(held),
        }
    }

    fn take_slot(&self) -> bool {
        self.held
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PlacementStore for GatedStore {
    async fn find_entity(&self, entity: EntityRef) -> StoreResult<Option<Entity>> {
        self.inner.find_entity(entity).await
    }

    async fn find_offer(&self, id: OfferId) -> StoreResult<Option<Offer>> {
        self.inner.find_offer(id).await
    }

    async fn applications_for_offer(&self, offer_id: OfferId) -> StoreResult<Vec<Application>> {
        self.inner.applications_for_offer(offer_id).await
    }

    async fn dependents_of(&self, internship_id: InternshipId) -> StoreResult<Vec<Entity>> {
        self.inner.dependents_of(internship_id).await
    }

    async fn internships_due_to_start(&self, today: NaiveDate) -> StoreResult<Vec<Internship>> {
        self.inner.internships_due_to_start(today).await
    }

    async fn internships_due_to_complete(
        &self,
        today: NaiveDate,
    ) -> StoreResult<Vec<Internship>> {
        self.inner.internships_due_to_complete(today).await
    }

    async fn commit(&self, change_set: &ChangeSet) -> StoreResult<()> {
        if self.take_slot() {
            self.barrier.wait().await;
        }
        self.inner.commit(change_set).await
    }

    async fn undispatched_notifications(&self, limit: usize) -> StoreResult<Vec<Notification>> {
        self.inner.undispatched_notifications(limit).await
    }

    async fn mark_dispatched(
        &self,
        ids: &[NotificationId],
        dispatched_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.inner.mark_dispatched(ids, dispatched_at).await
    }

    async fn notifications_for(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        self.inner.notifications_for(recipient).await
    }
}

pub type GatedService = WorkflowService<GatedStore, RecordingNotificationQueue, ManualClock>;

impl Harness {
    /// Returns a service over the harness state whose first `held` commits
    /// wait for each other.
    pub fn gated_service(&self, held: usize) -> GatedService {
        let store = GatedStore::new(self.store.as_ref().clone(), held);
        WorkflowService::new(
            Arc::new(store),
            Arc::clone(&self.queue),
            Arc::new(self.clock.clone()),
        )
        .with_retry_backoff(Duration::ZERO)
    }
}
