//! Shared world state for placement workflow BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use placement_engine::placement::{
    adapters::{
        clock::ManualClock,
        memory::{InMemoryPlacementStore, RecordingNotificationQueue},
    },
    domain::{Actor, Application, Attendance, InternshipId, Offer, Role, UserId},
    services::{InternshipSweep, TransitionResult, WorkflowError, WorkflowService},
};
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestWorkflowService =
    WorkflowService<InMemoryPlacementStore, RecordingNotificationQueue, ManualClock>;

/// Sweep type used by the BDD world.
pub type TestSweep =
    InternshipSweep<InMemoryPlacementStore, RecordingNotificationQueue, ManualClock>;

/// A named student and what the scenario created for them.
pub struct Participant {
    pub actor: Actor,
    pub application: Option<Application>,
    pub internship_id: Option<InternshipId>,
}

/// Scenario world for placement workflow behaviour tests.
pub struct PlacementWorld {
    pub clock: ManualClock,
    pub queue: Arc<RecordingNotificationQueue>,
    pub service: TestWorkflowService,
    pub sweep: TestSweep,
    pub hospital: Actor,
    pub doctor: Actor,
    pub offer: Option<Offer>,
    pub students: HashMap<String, Participant>,
    pub attendance: Option<Attendance>,
    pub last_result: Option<Result<TransitionResult, WorkflowError>>,
}

impl PlacementWorld {
    /// Creates a world whose clock reads 2026-05-01.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryPlacementStore::new());
        let queue = Arc::new(RecordingNotificationQueue::new());
        let clock = ManualClock::on(scenario_today());
        let shared_clock = Arc::new(clock.clone());
        let service =
            WorkflowService::new(Arc::clone(&store), Arc::clone(&queue), Arc::clone(&shared_clock))
                .with_retry_backoff(Duration::ZERO);
        let sweep = InternshipSweep::new(store, Arc::clone(&queue), shared_clock);

        Self {
            clock,
            queue,
            service,
            sweep,
            hospital: Actor::new(UserId::new(), Role::Hospital),
            doctor: Actor::new(UserId::new(), Role::Doctor),
            offer: None,
            students: HashMap::new(),
            attendance: None,
            last_result: None,
        }
    }

    /// Looks up a named student.
    ///
    /// # Errors
    ///
    /// Returns an error when the scenario never introduced the student.
    pub fn participant(&self, name: &str) -> Result<&Participant, eyre::Report> {
        self.students
            .get(name)
            .ok_or_else(|| eyre::eyre!("unknown student {name} in scenario world"))
    }

    /// Returns the application submitted by a named student.
    ///
    /// # Errors
    ///
    /// Returns an error when the student has not applied.
    pub fn application_of(&self, name: &str) -> Result<&Application, eyre::Report> {
        self.participant(name)?
            .application
            .as_ref()
            .ok_or_else(|| eyre::eyre!("{name} has not applied"))
    }
}

impl Default for PlacementWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a calendar date.
///
/// # Panics
///
/// Panics when the date does not exist.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Day every scenario starts on.
#[must_use]
pub fn scenario_today() -> NaiveDate {
    date(2026, 5, 1)
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PlacementWorld {
    PlacementWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
