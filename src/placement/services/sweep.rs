//! Date-driven internship sweep.

use super::{
    error::{WorkflowError, WorkflowResult},
    pipeline::TransitionPipeline,
};
use crate::placement::{
    domain::{Actor, EntityRef, Internship, InternshipId, InternshipStatus, Status},
    ports::{NotificationQueue, PlacementStore},
    validation::TransitionRequest,
};
use chrono::NaiveDate;
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;

/// An internship the sweep could not advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    /// Internship left unchanged.
    pub internship_id: InternshipId,
    /// Status the sweep tried to reach.
    pub target: InternshipStatus,
    /// Rendered error.
    pub error: String,
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Date the pass evaluated.
    pub today: NaiveDate,
    /// Internships moved to `active`.
    pub activated: Vec<InternshipId>,
    /// Internships moved to `completed`.
    pub completed: Vec<InternshipId>,
    /// Internships that failed to advance.
    pub failed: Vec<SweepFailure>,
    /// Outbox notifications redelivered after the batch.
    pub relayed: usize,
}

impl SweepReport {
    fn new(today: NaiveDate) -> Self {
        Self {
            today,
            activated: Vec::new(),
            completed: Vec::new(),
            failed: Vec::new(),
            relayed: 0,
        }
    }

    /// Returns how many transitions the pass committed.
    #[must_use]
    pub fn transitions(&self) -> usize {
        self.activated.len() + self.completed.len()
    }
}

/// Advances internships whose dates have been reached.
///
/// Each internship moves through the same validation and dispatch as an
/// external request, acting as the system authority. Selection excludes rows
/// already moved, so repeated passes on the same day change nothing.
#[derive(Clone)]
pub struct InternshipSweep<S, N, C>
where
    S: PlacementStore,
    N: NotificationQueue,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    pipeline: TransitionPipeline<S, N, C>,
}

impl<S, N, C> InternshipSweep<S, N, C>
where
    S: PlacementStore,
    N: NotificationQueue,
    C: Clock + Send + Sync,
{
    /// Creates a sweep over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, queue: Arc<N>, clock: Arc<C>) -> Self {
        let pipeline = TransitionPipeline::new(Arc::clone(&store), queue, Arc::clone(&clock));
        Self {
            store,
            clock,
            pipeline,
        }
    }

    /// Replaces the transition pipeline, e.g. to change its retry backoff.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: TransitionPipeline<S, N, C>) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Runs one pass: activations, then completions, then the outbox relay.
    ///
    /// An internship whose start and end dates have both passed is activated
    /// and completed in the same pass. Failures on individual internships are
    /// logged and reported without stopping the pass.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] when the due internships cannot be
    /// selected.
    pub async fn run_once(&self) -> WorkflowResult<SweepReport> {
        let today = self.clock.utc().date_naive();
        let mut report = SweepReport::new(today);

        for internship in self.store.internships_due_to_start(today).await? {
            if self.advance(&internship, InternshipStatus::Active, &mut report).await {
                report.activated.push(internship.id());
            }
        }
        for internship in self.store.internships_due_to_complete(today).await? {
            if self
                .advance(&internship, InternshipStatus::Completed, &mut report)
                .await
            {
                report.completed.push(internship.id());
            }
        }

        match self.pipeline.relay().relay_pending().await {
            Ok(relayed) => report.relayed = relayed,
            Err(err) => tracing::warn!(error = %err, "outbox relay failed"),
        }

        tracing::info!(
            %today,
            activated = report.activated.len(),
            completed = report.completed.len(),
            failed = report.failed.len(),
            relayed = report.relayed,
            "internship sweep finished"
        );
        Ok(report)
    }

    async fn advance(
        &self,
        internship: &Internship,
        target: InternshipStatus,
        report: &mut SweepReport,
    ) -> bool {
        let request = TransitionRequest::new(
            EntityRef::Internship(internship.id()),
            Status::Internship(target),
            Actor::system(),
        );
        match self.pipeline.execute(&request).await {
            Ok(_) => true,
            Err(WorkflowError::Rejected(reason)) if reason.is_benign() => {
                tracing::debug!(
                    internship_id = %internship.id(),
                    %reason,
                    "internship already advanced"
                );
                false
            }
            Err(err) => {
                tracing::warn!(
                    internship_id = %internship.id(),
                    target = %target,
                    error = %err,
                    "sweep could not advance internship"
                );
                report.failed.push(SweepFailure {
                    internship_id: internship.id(),
                    target,
                    error: err.to_string(),
                });
                false
            }
        }
    }
}
