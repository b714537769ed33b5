//! Validate, dispatch, commit, hand off: the path every transition takes.

use super::{
    dispatcher::{SideEffect, SideEffectDispatcher},
    error::{WorkflowError, WorkflowResult},
    relay::NotificationRelay,
};
use crate::placement::{
    domain::{ChangeSet, Entity},
    ports::{NotificationQueue, PlacementStore, StoreError},
    validation::{RejectionReason, TransitionRequest, validate},
};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Pause before the single retry of a transition that hit a store failure.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Outcome of a committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionResult {
    /// Entity state after the transition.
    pub entity: Entity,
    /// Side effects committed with it.
    pub side_effects: Vec<SideEffect>,
}

/// Runs transition requests through validation, dispatch, and an atomic
/// commit, then hands the committed notifications to the queue.
#[derive(Clone)]
pub struct TransitionPipeline<S, N, C>
where
    S: PlacementStore,
    N: NotificationQueue,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    dispatcher: SideEffectDispatcher<S, C>,
    relay: NotificationRelay<S, N, C>,
    retry_backoff: Duration,
}

impl<S, N, C> TransitionPipeline<S, N, C>
where
    S: PlacementStore,
    N: NotificationQueue,
    C: Clock + Send + Sync,
{
    /// Creates a pipeline with the default retry backoff.
    #[must_use]
    pub fn new(store: Arc<S>, queue: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            dispatcher: SideEffectDispatcher::new(Arc::clone(&store), Arc::clone(&clock)),
            relay: NotificationRelay::new(Arc::clone(&store), queue, Arc::clone(&clock)),
            store,
            clock,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Sets the pause before retrying after a store failure.
    #[must_use]
    pub const fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Returns the relay used for post-commit hand-off.
    #[must_use]
    pub const fn relay(&self) -> &NotificationRelay<S, N, C> {
        &self.relay
    }

    /// Executes a transition, retrying once after a failed commit.
    ///
    /// A version conflict on any row of the change set is retried at once;
    /// a transient store failure after the backoff. The retry re-reads and
    /// re-validates, so a transition that another request already applied
    /// surfaces as [`RejectionReason::AlreadyTerminal`] or
    /// [`RejectionReason::Conflict`] instead of applying twice, while one that
    /// only lost a race on a cascaded row (the offer, a competing
    /// application, the credited internship) is applied against fresh state.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Rejected`] when the request is refused,
    /// [`RejectionReason::Contention`] when the retry loses a version race
    /// again, and [`WorkflowError::Store`] when both attempts fail.
    pub async fn execute(&self, request: &TransitionRequest) -> WorkflowResult<TransitionResult> {
        let outcome = match self.attempt(request).await {
            Err(WorkflowError::Store(StoreError::Conflict(row))) => {
                tracing::debug!(
                    entity = %request.entity,
                    %row,
                    "version race lost, re-reading transition"
                );
                self.attempt(request).await
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(
                    entity = %request.entity,
                    error = %err,
                    backoff_ms = self.retry_backoff.as_millis(),
                    "store failure, retrying transition once"
                );
                tokio::time::sleep(self.retry_backoff).await;
                self.attempt(request).await
            }
            outcome => outcome,
        };
        outcome.map_err(|err| match err {
            WorkflowError::Store(StoreError::Conflict(row)) => {
                RejectionReason::Contention {
                    entity: request.entity,
                    row,
                }
                .into()
            }
            other => other,
        })
    }

    async fn attempt(&self, request: &TransitionRequest) -> WorkflowResult<TransitionResult> {
        let entity_ref = request.entity;
        let Some(snapshot) = self.store.snapshot(entity_ref).await? else {
            return Err(RejectionReason::NotFound { entity: entity_ref }.into());
        };
        let plan = validate(request, Some(&snapshot), self.clock.utc().date_naive())?;

        let mut updated = snapshot.entity.clone();
        updated.apply_status(plan.to, plan.note.clone(), &*self.clock)?;
        let mut change_set = ChangeSet::new();
        change_set.update(updated.clone(), snapshot.entity.version());

        let side_effects = self
            .dispatcher
            .apply(&plan, &updated, &snapshot, &mut change_set)
            .await?;

        self.store.commit(&change_set).await?;

        tracing::info!(
            entity = %plan.entity,
            from = %plan.from,
            to = %plan.to,
            actor = %plan.actor,
            writes = change_set.entity_writes().len() + change_set.offer_writes().len(),
            notifications = change_set.notifications().len(),
            "transition committed"
        );

        self.relay.deliver(change_set.notifications()).await;
        Ok(TransitionResult {
            entity: updated,
            side_effects,
        })
    }
}
