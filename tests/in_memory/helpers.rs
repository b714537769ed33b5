//! Shared helpers for in-memory placement integration tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use placement_engine::placement::{
    adapters::{
        clock::ManualClock,
        memory::{InMemoryPlacementStore, RecordingNotificationQueue},
    },
    domain::{
        Actor, Application, ApplicationStatus, EntityRef, Internship, InternshipId, NewOffer,
        NotificationKind, Offer, Role, Status, UserId,
    },
    services::{
        InternshipSweep, SideEffect, TransitionPipeline, TransitionResult, WorkflowResult,
        WorkflowService,
    },
    validation::TransitionRequest,
};
use rstest::fixture;

/// Workflow service wired to in-memory adapters.
pub type TestService =
    WorkflowService<InMemoryPlacementStore, RecordingNotificationQueue, ManualClock>;

/// Sweep wired to the same in-memory adapters.
pub type TestSweep =
    InternshipSweep<InMemoryPlacementStore, RecordingNotificationQueue, ManualClock>;

/// Builds a calendar date.
///
/// # Panics
///
/// Panics when the date does not exist.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Placement engine backed by in-memory adapters, with a hospital, a
/// supervising doctor, a tutor, and an administrator.
pub struct Engine {
    pub store: Arc<InMemoryPlacementStore>,
    pub queue: Arc<RecordingNotificationQueue>,
    pub clock: ManualClock,
    pub service: TestService,
    pub sweep: TestSweep,
    pub hospital: Actor,
    pub doctor: Actor,
    pub tutor: Actor,
    pub admin: Actor,
}

impl Engine {
    /// Creates an engine whose clock reads 2026-01-15.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryPlacementStore::new());
        let queue = Arc::new(RecordingNotificationQueue::new());
        let clock = ManualClock::on(date(2026, 1, 15));
        let shared_clock = Arc::new(clock.clone());
        let service =
            WorkflowService::new(Arc::clone(&store), Arc::clone(&queue), Arc::clone(&shared_clock))
                .with_retry_backoff(Duration::ZERO);
        let pipeline = TransitionPipeline::new(
            Arc::clone(&store),
            Arc::clone(&queue),
            Arc::clone(&shared_clock),
        )
        .with_retry_backoff(Duration::ZERO);
        let sweep = InternshipSweep::new(Arc::clone(&store), Arc::clone(&queue), shared_clock)
            .with_pipeline(pipeline);
        Self {
            store,
            queue,
            clock,
            service,
            sweep,
            hospital: Actor::new(UserId::new(), Role::Hospital),
            doctor: Actor::new(UserId::new(), Role::Doctor),
            tutor: Actor::new(UserId::new(), Role::Tutor),
            admin: Actor::new(UserId::new(), Role::Admin),
        }
    }

    /// Publishes a February-to-April offer supervised by the engine's doctor.
    ///
    /// # Panics
    ///
    /// Panics when the offer cannot be published.
    pub async fn offer(&self, positions: u32) -> Offer {
        self.service
            .open_offer(
                self.hospital,
                NewOffer {
                    hospital_id: self.hospital.id,
                    supervisor_id: self.doctor.id,
                    title: "General surgery".to_owned(),
                    start_date: date(2026, 2, 1),
                    end_date: date(2026, 4, 30),
                    positions,
                },
            )
            .await
            .expect("offer should be published")
    }

    /// Submits an application for `student`.
    ///
    /// # Panics
    ///
    /// Panics when the application is refused.
    pub async fn apply(&self, student: Actor, offer: &Offer) -> Application {
        self.service
            .submit_application(student, offer.id())
            .await
            .expect("application should be submitted")
    }

    /// Requests a transition.
    ///
    /// # Errors
    ///
    /// Returns the workflow error for refused or failed transitions.
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

    /// Moves an application to `to` on behalf of the hospital.
    ///
    /// # Errors
    ///
    /// Returns the workflow error for refused or failed transitions.
    pub async fn decide(
        &self,
        application: &Application,
        to: ApplicationStatus,
    ) -> WorkflowResult<TransitionResult> {
        self.request(
            EntityRef::Application(application.id()),
            Status::Application(to),
            self.hospital,
        )
        .await
    }

    /// Applies, reviews and accepts `student`, returning the internship.
    ///
    /// # Panics
    ///
    /// Panics when any step is refused.
    pub async fn place(&self, student: Actor, offer: &Offer) -> Internship {
        let application = self.apply(student, offer).await;
        self.decide(&application, ApplicationStatus::Reviewing)
            .await
            .expect("review should start");
        let accepted = self
            .decide(&application, ApplicationStatus::Accepted)
            .await
            .expect("acceptance should commit");
        let internship_id =
            created_internship(&accepted.side_effects).expect("internship should be created");
        self.internship(internship_id).await
    }

    /// Loads an internship.
    ///
    /// # Panics
    ///
    /// Panics when the internship is missing.
    pub async fn internship(&self, internship_id: InternshipId) -> Internship {
        self.service
            .find(EntityRef::Internship(internship_id))
            .await
            .expect("lookup should succeed")
            .and_then(|entity| entity.as_internship().cloned())
            .expect("internship should exist")
    }

    /// Loads the current status of an entity.
    ///
    /// # Panics
    ///
    /// Panics when the entity is missing.
    pub async fn status_of(&self, entity: EntityRef) -> Status {
        self.service
            .find(entity)
            .await
            .expect("lookup should succeed")
            .expect("entity should exist")
            .status()
    }

    /// Returns the kinds of notification `recipient` has received.
    #[must_use]
    pub fn received(&self, recipient: UserId) -> Vec<NotificationKind> {
        self.queue
            .accepted_for(recipient)
            .into_iter()
            .map(|queued| queued.kind)
            .collect()
    }
}

/// Provides a fresh engine for each test.
#[fixture]
pub fn engine() -> Engine {
    Engine::new()
}

/// Creates a new student actor.
#[must_use]
pub fn student() -> Actor {
    Actor::new(UserId::new(), Role::Student)
}

/// Finds the internship created by an acceptance.
#[must_use]
pub fn created_internship(side_effects: &[SideEffect]) -> Option<InternshipId> {
    side_effects.iter().find_map(|effect| match effect {
        SideEffect::InternshipCreated { internship_id } => Some(*internship_id),
        _ => None,
    })
}
