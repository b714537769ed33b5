//! Workflow facade: the single entry point for external status changes and
//! for creating the records the workflow governs.

use super::{
    dispatcher::SideEffect,
    error::{WorkflowError, WorkflowResult},
    pipeline::{TransitionPipeline, TransitionResult},
};
use crate::placement::{
    domain::{
        Actor, Application, Attendance, AttendanceStatus, ChangeSet, Entity, EntityKind,
        EntityRef, Evaluation, EvaluationType, Internship, InternshipId, LogbookEntry, NewOffer,
        Notification, Offer, OfferId, PlacementDomainError, Role, Status, UserId,
    },
    ports::{NotificationQueue, PlacementStore, StoreError},
    validation::{RejectionReason, TransitionRequest},
};
use chrono::NaiveDate;
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// External shape of a transition outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransitionResponse {
    /// The transition committed.
    Ok {
        /// Entity state after the transition.
        entity: Entity,
        /// Side effects committed with it.
        side_effects: Vec<SideEffect>,
    },
    /// The transition was refused and nothing changed.
    Rejected {
        /// HTTP status code equivalent.
        http_status: u16,
        /// Why the transition was refused.
        reason: RejectionReason,
    },
}

impl From<TransitionResult> for TransitionResponse {
    fn from(result: TransitionResult) -> Self {
        Self::Ok {
            entity: result.entity,
            side_effects: result.side_effects,
        }
    }
}

impl From<RejectionReason> for TransitionResponse {
    fn from(reason: RejectionReason) -> Self {
        Self::Rejected {
            http_status: reason.http_status(),
            reason,
        }
    }
}

/// Attendance to record for a day of an internship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceRecord {
    /// Day attended.
    pub date: NaiveDate,
    /// Hours attended.
    pub hours: u32,
    /// Initial status, one of the unvalidated ones.
    pub status: AttendanceStatus,
}

/// Evaluation to draft for an internship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationDraft {
    /// Kind of evaluation.
    pub evaluation_type: EvaluationType,
    /// Optional percentage score.
    pub score: Option<u8>,
    /// Optional free-text comments.
    pub comments: Option<String>,
}

impl EvaluationDraft {
    /// Creates a draft with no score or comments.
    #[must_use]
    pub const fn new(evaluation_type: EvaluationType) -> Self {
        Self {
            evaluation_type,
            score: None,
            comments: None,
        }
    }

    /// Sets the score.
    #[must_use]
    pub const fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score);
        self
    }

    /// Sets the comments.
    #[must_use]
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }
}

/// Placement workflow orchestration service.
#[derive(Clone)]
pub struct WorkflowService<S, N, C>
where
    S: PlacementStore,
    N: NotificationQueue,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    pipeline: TransitionPipeline<S, N, C>,
    retry_backoff: Duration,
}

impl<S, N, C> WorkflowService<S, N, C>
where
    S: PlacementStore,
    N: NotificationQueue,
    C: Clock + Send + Sync,
{
    /// Creates a workflow service.
    #[must_use]
    pub fn new(store: Arc<S>, queue: Arc<N>, clock: Arc<C>) -> Self {
        let pipeline = TransitionPipeline::new(Arc::clone(&store), queue, Arc::clone(&clock));
        Self {
            store,
            clock,
            pipeline,
            retry_backoff: super::pipeline::DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Sets the pause before retrying after a store failure.
    #[must_use]
    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.pipeline = self.pipeline.with_retry_backoff(retry_backoff);
        self.retry_backoff = retry_backoff;
        self
    }

    /// Requests a status change on behalf of an external actor.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Rejected`] with the specific
    /// [`RejectionReason`] when the request is refused, in which case nothing
    /// was written. Actors claiming the system role are refused with
    /// [`RejectionReason::Forbidden`]. Returns [`WorkflowError::Store`] when
    /// the store fails twice in a row.
    pub async fn request_transition(
        &self,
        request: TransitionRequest,
    ) -> WorkflowResult<TransitionResult> {
        if request.actor.role == Role::System {
            let reason = RejectionReason::Forbidden {
                entity: request.entity,
                role: request.actor.role,
                to: request.to,
            };
            tracing::warn!(entity = %request.entity, "external actor claimed the system role");
            return Err(reason.into());
        }

        let outcome = self.pipeline.execute(&request).await;
        if let Err(WorkflowError::Rejected(reason)) = &outcome {
            tracing::info!(
                entity = %request.entity,
                to = %request.to,
                actor = %request.actor,
                %reason,
                "transition rejected"
            );
        }
        outcome
    }

    /// Requests a status change from loosely typed input and folds refusals
    /// into the response.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] when the store fails twice in a row.
    /// Refused transitions, including status names that `kind` does not
    /// know, are returned as [`TransitionResponse::Rejected`].
    pub async fn transition(
        &self,
        kind: EntityKind,
        id: Uuid,
        status: &str,
        actor: Actor,
        note: Option<String>,
    ) -> WorkflowResult<TransitionResponse> {
        let entity = EntityRef::from_parts(kind, id);
        let to = match Status::parse(kind, status) {
            Ok(to) => to,
            Err(err) => {
                tracing::info!(%entity, actor = %actor, error = %err, "transition rejected");
                return Ok(RejectionReason::UnknownStatus {
                    entity,
                    status: err.value,
                }
                .into());
            }
        };
        let mut request = TransitionRequest::new(entity, to, actor);
        request.note = note;
        match self.request_transition(request).await {
            Ok(result) => Ok(result.into()),
            Err(WorkflowError::Rejected(reason)) => Ok(reason.into()),
            Err(other) => Err(other),
        }
    }

    /// Publishes a new offer.
    ///
    /// Hospitals may publish offers for themselves; administrators for any
    /// hospital.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotPermitted`] for other actors,
    /// [`WorkflowError::Domain`] for invalid offer data, and
    /// [`WorkflowError::Store`] when persistence fails.
    pub async fn open_offer(&self, actor: Actor, new_offer: NewOffer) -> WorkflowResult<Offer> {
        let permitted = match actor.role {
            Role::Admin => true,
            Role::Hospital => actor.id == new_offer.hospital_id,
            _ => false,
        };
        if !permitted {
            return Err(not_permitted("open an offer", actor));
        }

        let offer = Offer::publish(new_offer, &*self.clock)?;
        let mut change_set = ChangeSet::new();
        change_set.insert_offer(offer.clone());
        self.commit(&change_set).await?;
        tracing::info!(offer_id = %offer.id(), positions = offer.positions(), "offer published");
        Ok(offer)
    }

    /// Submits a student's application to an offer.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotPermitted`] for non-students,
    /// [`WorkflowError::OfferNotFound`] for unknown offers,
    /// [`PlacementDomainError::OfferFull`] when no position remains, and
    /// [`PlacementDomainError::DuplicateApplication`] when the student
    /// already has an open application for the offer.
    pub async fn submit_application(
        &self,
        actor: Actor,
        offer_id: OfferId,
    ) -> WorkflowResult<Application> {
        if actor.role != Role::Student {
            return Err(not_permitted("apply to an offer", actor));
        }
        let offer = self
            .store
            .find_offer(offer_id)
            .await?
            .ok_or(WorkflowError::OfferNotFound(offer_id))?;
        if offer.remaining_positions() == 0 {
            return Err(PlacementDomainError::OfferFull(offer_id).into());
        }
        let existing = self.store.applications_for_offer(offer_id).await?;
        if existing
            .iter()
            .any(|application| application.student_id() == actor.id && application.is_open())
        {
            return Err(PlacementDomainError::DuplicateApplication {
                student_id: actor.id,
                offer_id,
            }
            .into());
        }

        let application = Application::submit(actor.id, offer_id, &*self.clock);
        let mut change_set = ChangeSet::new();
        change_set.insert(application.clone());
        self.commit(&change_set).await.map_err(|err| match err {
            WorkflowError::Store(StoreError::Duplicate(_)) => {
                PlacementDomainError::DuplicateApplication {
                    student_id: actor.id,
                    offer_id,
                }
                .into()
            }
            other => other,
        })?;
        tracing::info!(
            application_id = %application.id(),
            %offer_id,
            "application submitted"
        );
        Ok(application)
    }

    /// Records a draft logbook entry for the acting student's internship.
    ///
    /// # Errors
    ///
    /// Returns [`RejectionReason::NotFound`] for unknown internships,
    /// [`WorkflowError::NotPermitted`] when the actor is not the internship's
    /// student, and [`WorkflowError::Domain`] when the internship is closed
    /// or the date falls outside it.
    pub async fn record_logbook_entry(
        &self,
        actor: Actor,
        internship_id: InternshipId,
        date: NaiveDate,
        activities: impl Into<String>,
    ) -> WorkflowResult<LogbookEntry> {
        let activities = activities.into();
        self.attach(
            actor,
            internship_id,
            "record for this internship",
            |internship| is_placed_student(actor, internship),
            |internship| LogbookEntry::draft(internship, date, activities.clone(), &*self.clock),
        )
        .await
    }

    /// Records attendance for the acting student's internship.
    ///
    /// # Errors
    ///
    /// Returns [`RejectionReason::NotFound`] for unknown internships,
    /// [`WorkflowError::NotPermitted`] when the actor is not the internship's
    /// student, and [`WorkflowError::Domain`] for closed internships,
    /// out-of-range dates or hours, and validated initial statuses.
    pub async fn record_attendance(
        &self,
        actor: Actor,
        internship_id: InternshipId,
        record: AttendanceRecord,
    ) -> WorkflowResult<Attendance> {
        self.attach(
            actor,
            internship_id,
            "record for this internship",
            |internship| is_placed_student(actor, internship),
            |internship| {
                Attendance::record(
                    internship,
                    record.date,
                    record.hours,
                    record.status,
                    &*self.clock,
                )
            },
        )
        .await
    }

    /// Drafts an evaluation of an internship's student.
    ///
    /// Tutors may evaluate any internship; doctors only the ones they
    /// supervise.
    ///
    /// # Errors
    ///
    /// Returns [`RejectionReason::NotFound`] for unknown internships,
    /// [`WorkflowError::NotPermitted`] for other actors, and
    /// [`WorkflowError::Domain`] for closed internships or invalid scores.
    pub async fn create_evaluation(
        &self,
        actor: Actor,
        internship_id: InternshipId,
        draft: EvaluationDraft,
    ) -> WorkflowResult<Evaluation> {
        self.attach(
            actor,
            internship_id,
            "evaluate this internship",
            |internship| match actor.role {
                Role::Tutor => true,
                Role::Doctor => internship.supervisor_id() == actor.id,
                _ => false,
            },
            |internship| {
                Evaluation::draft(
                    internship,
                    actor.id,
                    draft.evaluation_type,
                    draft.score,
                    draft.comments.clone(),
                    &*self.clock,
                )
            },
        )
        .await
    }

    /// Finds any workflow entity.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] when the lookup fails.
    pub async fn find(&self, entity: EntityRef) -> WorkflowResult<Option<Entity>> {
        Ok(self.store.find_entity(entity).await?)
    }

    /// Finds an offer.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] when the lookup fails.
    pub async fn find_offer(&self, offer_id: OfferId) -> WorkflowResult<Option<Offer>> {
        Ok(self.store.find_offer(offer_id).await?)
    }

    /// Lists the outbox notifications addressed to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] when the lookup fails.
    pub async fn notifications_for(&self, recipient: UserId) -> WorkflowResult<Vec<Notification>> {
        Ok(self.store.notifications_for(recipient).await?)
    }

    /// Inserts a record built from the current internship, re-reading the
    /// internship once when it changed before the insert committed.
    async fn attach<E, P, B>(
        &self,
        actor: Actor,
        internship_id: InternshipId,
        operation: &'static str,
        permitted: P,
        build: B,
    ) -> WorkflowResult<E>
    where
        E: Clone + Into<Entity> + Send,
        P: Fn(&Internship) -> bool + Send + Sync,
        B: Fn(&Internship) -> Result<E, PlacementDomainError> + Send + Sync,
    {
        let entity = EntityRef::Internship(internship_id);
        let mut raced = false;
        loop {
            let internship = self
                .store
                .find_internship(internship_id)
                .await?
                .ok_or(RejectionReason::NotFound { entity })?;
            if !permitted(&internship) {
                return Err(not_permitted(operation, actor));
            }
            let record = build(&internship)?;
            let mut change_set = ChangeSet::new();
            change_set.insert_dependent(record.clone(), &internship, &*self.clock);
            match self.commit(&change_set).await {
                Err(WorkflowError::Store(StoreError::Conflict(row))) if !raced => {
                    tracing::debug!(%internship_id, %row, "internship changed, re-reading");
                    raced = true;
                }
                Err(WorkflowError::Store(StoreError::Conflict(row))) => {
                    return Err(RejectionReason::Contention { entity, row }.into());
                }
                outcome => return outcome.map(|()| record),
            }
        }
    }

    async fn commit(&self, change_set: &ChangeSet) -> WorkflowResult<()> {
        match self.store.commit(change_set).await {
            Err(err) if err.is_transient() => {
                tracing::warn!(error = %err, "store failure, retrying commit once");
                tokio::time::sleep(self.retry_backoff).await;
                Ok(self.store.commit(change_set).await?)
            }
            outcome => Ok(outcome?),
        }
    }
}

fn is_placed_student(actor: Actor, internship: &Internship) -> bool {
    actor.role == Role::Student && internship.student_id() == actor.id
}

const fn not_permitted(operation: &'static str, actor: Actor) -> WorkflowError {
    WorkflowError::NotPermitted {
        operation,
        role: actor.role,
    }
}
