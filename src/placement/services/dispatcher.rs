//! Side-effect dispatcher: turns an approved transition into cascading writes
//! and notifications staged on the same change set.

use super::error::{WorkflowError, WorkflowResult};
use crate::placement::{
    domain::{
        Actor, Application, ApplicationId, ApplicationStatus, AttendanceStatus, ChangeSet, Entity,
        EntityRef, EntitySnapshot, EvaluationStatus, EvaluationType, Internship, InternshipId,
        LogbookStatus, Notification, NotificationKind, Offer, OfferId, PlacementDomainError,
        Status, UserId,
    },
    ports::{PlacementStore, StoreError},
    validation::{Audience, Effect, RejectionReason, TransitionPlan, TransitionRequest, validate},
};
use mockable::Clock;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Rejection reason recorded on applications closed by an exhausted offer.
pub const CAPACITY_EXHAUSTED: &str = "offer capacity exhausted";

/// Description of one side effect carried out for a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SideEffect {
    /// An internship was created for an accepted application.
    InternshipCreated {
        /// New internship.
        internship_id: InternshipId,
    },
    /// An offer position was consumed.
    PositionFilled {
        /// Offer.
        offer_id: OfferId,
        /// Positions left after the fill.
        remaining: u32,
    },
    /// A competing application was rejected because the offer filled up.
    ApplicationRejected {
        /// Rejected application.
        application_id: ApplicationId,
    },
    /// Attendance hours were credited to the internship.
    HoursCredited {
        /// Credited internship.
        internship_id: InternshipId,
        /// Hours added.
        hours: u32,
        /// Total after crediting.
        total: u32,
    },
    /// A dependent of a cancelled internship was moved to a terminal status.
    DependentClosed {
        /// Closed dependent.
        entity: EntityRef,
        /// Its new status.
        status: Status,
    },
    /// A notification was staged in the outbox.
    NotificationQueued {
        /// Recipient.
        recipient: UserId,
        /// Notification kind.
        kind: NotificationKind,
    },
}

/// Applies the effects declared by a transition row.
#[derive(Clone)]
pub struct SideEffectDispatcher<S, C>
where
    S: PlacementStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> SideEffectDispatcher<S, C>
where
    S: PlacementStore,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Stages every cascading write and notification of `plan`.
    ///
    /// `updated` is the primary entity after the status change; `snapshot`
    /// is its state and context before the change. Cascading writes carry
    /// the versions observed here, so a concurrent change to any of them
    /// fails the whole commit.
    ///
    /// # Errors
    ///
    /// Returns [`RejectionReason::NoCapacity`] when accepting would exceed
    /// the offer's positions, and [`WorkflowError::Store`] when related rows
    /// cannot be read.
    pub async fn apply(
        &self,
        plan: &TransitionPlan,
        updated: &Entity,
        snapshot: &EntitySnapshot,
        change_set: &mut ChangeSet,
    ) -> WorkflowResult<Vec<SideEffect>> {
        let mut effects = Vec::new();
        for effect in plan.effects {
            match *effect {
                Effect::Notify(audience, kind) => {
                    let recipient = match audience {
                        Audience::Student => Some(updated.student_id()),
                        Audience::Supervisor => snapshot.supervisor_id,
                    };
                    if let Some(recipient) = recipient {
                        effects.push(self.notify(change_set, recipient, kind, updated, plan));
                    }
                }
                Effect::PlaceStudent => {
                    effects.extend(self.place_student(updated, change_set).await?);
                }
                Effect::CreditHours => {
                    effects.extend(self.credit_hours(updated, change_set).await?);
                }
                Effect::PromptFinalEvaluations => {
                    effects.extend(
                        self.prompt_final_evaluations(updated, plan, change_set)
                            .await?,
                    );
                }
                Effect::CloseDependents => {
                    effects.extend(self.close_dependents(updated, change_set).await?);
                }
            }
        }
        Ok(effects)
    }

    fn notify(
        &self,
        change_set: &mut ChangeSet,
        recipient: UserId,
        kind: NotificationKind,
        subject: &Entity,
        plan: &TransitionPlan,
    ) -> SideEffect {
        let payload = json!({
            "subject": subject.entity_ref(),
            "from": plan.from.as_str(),
            "to": plan.to.as_str(),
            "note": plan.note,
        });
        change_set.notify(Notification::new(
            recipient,
            kind,
            subject.entity_ref(),
            payload,
            &*self.clock,
        ));
        SideEffect::NotificationQueued { recipient, kind }
    }

    async fn place_student(
        &self,
        updated: &Entity,
        change_set: &mut ChangeSet,
    ) -> WorkflowResult<Vec<SideEffect>> {
        let Some(application) = updated.as_application() else {
            return Ok(Vec::new());
        };
        let mut offer = self.load_offer(application.offer_id(), change_set).await?;
        let expected_version = offer.revision().version;
        offer
            .fill_position(&*self.clock)
            .map_err(|err| match err {
                PlacementDomainError::OfferFull(offer_id) => {
                    WorkflowError::Rejected(RejectionReason::NoCapacity { offer_id })
                }
                other => WorkflowError::Domain(other),
            })?;

        let internship = Internship::from_acceptance(application, &offer, &*self.clock)?;
        let mut effects = vec![
            SideEffect::InternshipCreated {
                internship_id: internship.id(),
            },
            SideEffect::PositionFilled {
                offer_id: offer.id(),
                remaining: offer.remaining_positions(),
            },
        ];
        change_set.insert(internship);

        if offer.remaining_positions() == 0 {
            let competitors = self.store.applications_for_offer(offer.id()).await?;
            for competitor in competitors
                .into_iter()
                .filter(|other| other.id() != application.id() && other.is_open())
            {
                effects.extend(self.reject_competitor(competitor, change_set)?);
            }
        }

        tracing::debug!(
            offer_id = %offer.id(),
            remaining = offer.remaining_positions(),
            "offer position filled"
        );
        change_set.update_offer(offer, expected_version);
        Ok(effects)
    }

    fn reject_competitor(
        &self,
        competitor: Application,
        change_set: &mut ChangeSet,
    ) -> WorkflowResult<Vec<SideEffect>> {
        let application_id = competitor.id();
        let snapshot = EntitySnapshot::new(Entity::Application(competitor), None);
        let (plan, updated) = self.cascade(
            &snapshot,
            Status::Application(ApplicationStatus::Rejected),
            Some(CAPACITY_EXHAUSTED.to_owned()),
            change_set,
        )?;

        let mut effects = vec![SideEffect::ApplicationRejected { application_id }];
        for effect in plan.effects {
            if let Effect::Notify(Audience::Student, kind) = *effect {
                effects.push(self.notify(change_set, updated.student_id(), kind, &updated, &plan));
            }
        }
        Ok(effects)
    }

    async fn credit_hours(
        &self,
        updated: &Entity,
        change_set: &mut ChangeSet,
    ) -> WorkflowResult<Vec<SideEffect>> {
        let Some(attendance) = updated.as_attendance() else {
            return Ok(Vec::new());
        };
        let internship = self
            .load_internship(attendance.internship_id(), change_set)
            .await?;
        let expected_version = internship.revision().version;
        let mut credited = internship;
        credited.credit_hours(attendance.hours(), &*self.clock);
        let effect = SideEffect::HoursCredited {
            internship_id: credited.id(),
            hours: attendance.hours(),
            total: credited.credited_hours(),
        };
        change_set.update(credited, expected_version);
        Ok(vec![effect])
    }

    async fn prompt_final_evaluations(
        &self,
        updated: &Entity,
        plan: &TransitionPlan,
        change_set: &mut ChangeSet,
    ) -> WorkflowResult<Vec<SideEffect>> {
        let Some(internship) = updated.as_internship() else {
            return Ok(Vec::new());
        };
        let dependents = self.store.dependents_of(internship.id()).await?;
        let has_final = dependents
            .iter()
            .filter_map(Entity::as_evaluation)
            .any(|evaluation| evaluation.evaluation_type() == EvaluationType::Final);
        let mut recipients: Vec<UserId> = if has_final {
            dependents
                .iter()
                .filter_map(Entity::as_evaluation)
                .filter(|evaluation| evaluation.is_outstanding_final())
                .map(|evaluation| evaluation.evaluator_id())
                .collect()
        } else {
            vec![internship.supervisor_id()]
        };
        recipients.sort();
        recipients.dedup();

        let kind = NotificationKind::FinalEvaluationDue;
        let mut effects = vec![self.notify(change_set, internship.student_id(), kind, updated, plan)];
        for recipient in recipients {
            effects.push(self.notify(change_set, recipient, kind, updated, plan));
        }
        Ok(effects)
    }

    async fn close_dependents(
        &self,
        updated: &Entity,
        change_set: &mut ChangeSet,
    ) -> WorkflowResult<Vec<SideEffect>> {
        let Some(internship) = updated.as_internship() else {
            return Ok(Vec::new());
        };
        let dependents = self.store.dependents_of(internship.id()).await?;
        let mut effects = Vec::new();
        for dependent in dependents {
            let Some(status) = closing_status(&dependent) else {
                continue;
            };
            let snapshot = EntitySnapshot::new(dependent, Some(internship.supervisor_id()));
            let (_, closed) = self.cascade(&snapshot, status, None, change_set)?;
            effects.push(SideEffect::DependentClosed {
                entity: closed.entity_ref(),
                status,
            });
        }
        tracing::debug!(
            internship_id = %internship.id(),
            closed = effects.len(),
            "closed internship dependents"
        );
        Ok(effects)
    }

    /// Moves a related entity through the allow-list as the system authority
    /// and stages the write.
    fn cascade(
        &self,
        snapshot: &EntitySnapshot,
        to: Status,
        note: Option<String>,
        change_set: &mut ChangeSet,
    ) -> WorkflowResult<(TransitionPlan, Entity)> {
        let mut request = TransitionRequest::new(snapshot.entity.entity_ref(), to, Actor::system());
        request.note = note;
        let plan = validate(&request, Some(snapshot), self.clock.utc().date_naive())?;

        let mut updated = snapshot.entity.clone();
        updated.apply_status(to, plan.note.clone(), &*self.clock)?;
        change_set.update(updated.clone(), snapshot.entity.version());
        Ok((plan, updated))
    }

    async fn load_offer(&self, offer_id: OfferId, change_set: &ChangeSet) -> WorkflowResult<Offer> {
        if let Some(staged) = change_set.staged_offer(offer_id) {
            return Ok(staged.clone());
        }
        self.store
            .find_offer(offer_id)
            .await?
            .ok_or(WorkflowError::OfferNotFound(offer_id))
    }

    async fn load_internship(
        &self,
        internship_id: InternshipId,
        change_set: &ChangeSet,
    ) -> WorkflowResult<Internship> {
        let entity_ref = EntityRef::Internship(internship_id);
        if let Some(staged) = change_set.staged(entity_ref).and_then(Entity::as_internship) {
            return Ok(staged.clone());
        }
        self.store
            .find_internship(internship_id)
            .await?
            .ok_or_else(|| WorkflowError::Store(StoreError::NotFound(entity_ref.to_string())))
    }
}

/// Terminal status a dependent takes when its internship is cancelled, or
/// `None` when it is already terminal.
#[must_use]
pub fn closing_status(entity: &Entity) -> Option<Status> {
    if entity.status().is_terminal() {
        return None;
    }
    match entity {
        Entity::LogbookEntry(_) => Some(Status::LogbookEntry(LogbookStatus::Cancelled)),
        Entity::Attendance(_) => Some(Status::Attendance(AttendanceStatus::Rejected)),
        Entity::Evaluation(_) => Some(Status::Evaluation(EvaluationStatus::Cancelled)),
        Entity::Application(_) | Entity::Internship(_) => None,
    }
}
