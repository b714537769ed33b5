//! The transition allow-list.
//!
//! Every legal status change of every entity kind is one row of
//! [`TRANSITION_TABLE`]. A pair that has no row is illegal for every actor.

use crate::placement::domain::{
    Actor, ApplicationStatus as App, AttendanceStatus as Att, EntityKind, EntitySnapshot,
    EvaluationStatus as Eval, InternshipStatus as Int, LogbookStatus as Log, NotificationKind,
    Role, Status,
};
use chrono::NaiveDate;
use std::fmt;

/// Participant allowed to trigger a transition row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    /// The hospital that published the offer, or any doctor.
    Reviewer,
    /// The student the entity belongs to.
    OwningStudent,
    /// The doctor supervising the owning internship.
    AssignedDoctor,
    /// The doctor or tutor who wrote the evaluation.
    Evaluator,
    /// The student being evaluated.
    EvaluatedStudent,
    /// A platform administrator.
    Admin,
    /// The system authority.
    System,
}

impl Party {
    /// Returns `true` when `actor` acts as this party for `snapshot`.
    ///
    /// The system authority is exempt from per-role checks and is admitted
    /// by every party.
    #[must_use]
    pub fn admits(self, actor: &Actor, snapshot: &EntitySnapshot) -> bool {
        if actor.is_system() {
            return true;
        }
        match self {
            Self::Reviewer => match actor.role {
                Role::Hospital => snapshot.offer_hospital_id == Some(actor.id),
                Role::Doctor => true,
                _ => false,
            },
            Self::OwningStudent | Self::EvaluatedStudent => {
                actor.role == Role::Student && actor.id == snapshot.entity.student_id()
            }
            Self::AssignedDoctor => {
                actor.role == Role::Doctor && snapshot.supervisor_id == Some(actor.id)
            }
            Self::Evaluator => {
                matches!(actor.role, Role::Doctor | Role::Tutor)
                    && snapshot
                        .entity
                        .as_evaluation()
                        .is_some_and(|evaluation| evaluation.evaluator_id() == actor.id)
            }
            Self::Admin => actor.role == Role::Admin,
            Self::System => false,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Reviewer => "reviewer",
            Self::OwningStudent => "owning student",
            Self::AssignedDoctor => "assigned doctor",
            Self::Evaluator => "evaluator",
            Self::EvaluatedStudent => "evaluated student",
            Self::Admin => "admin",
            Self::System => "system",
        };
        f.write_str(label)
    }
}

/// Date condition attached to a transition row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// No date condition.
    Open,
    /// The internship start date must have been reached.
    StartDateReached,
    /// The internship end date must have passed.
    EndDatePassed,
}

impl Gate {
    /// Returns the first day the gate opens for `snapshot`, or `None` when the
    /// gate is already open on `today`.
    #[must_use]
    pub fn pending_until(self, snapshot: &EntitySnapshot, today: NaiveDate) -> Option<NaiveDate> {
        let internship = snapshot.entity.as_internship()?;
        match self {
            Self::Open => None,
            Self::StartDateReached => {
                (!internship.is_due_to_start(today)).then(|| internship.start_date())
            }
            Self::EndDatePassed => (!internship.is_due_to_complete(today))
                .then(|| internship.end_date().succ_opt().unwrap_or(internship.end_date())),
        }
    }
}

/// Recipient group of a notification effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    /// The student the entity belongs to.
    Student,
    /// The supervising doctor of the owning internship.
    Supervisor,
}

/// Side effect declared by a transition row and carried out by the
/// dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Enqueue a notification.
    Notify(Audience, NotificationKind),
    /// Create the internship, consume offer capacity, and reject competing
    /// applications once capacity is exhausted.
    PlaceStudent,
    /// Credit the attendance hours to the internship.
    CreditHours,
    /// Prompt evaluators to finalise outstanding final evaluations.
    PromptFinalEvaluations,
    /// Move every open dependent of the internship to a terminal status.
    CloseDependents,
}

/// One row of the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Source status.
    pub from: Status,
    /// Target status.
    pub to: Status,
    /// Parties allowed to trigger the transition.
    pub parties: &'static [Party],
    /// Date condition.
    pub gate: Gate,
    /// Declared side effects, applied in order.
    pub effects: &'static [Effect],
}

impl TransitionRule {
    /// Returns the entity kind the row governs.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.from.kind()
    }
}

const REVIEWERS: &[Party] = &[Party::Reviewer];
const OWNING_STUDENT: &[Party] = &[Party::OwningStudent];
const ASSIGNED_DOCTOR: &[Party] = &[Party::AssignedDoctor];
const EVALUATOR: &[Party] = &[Party::Evaluator];
const EVALUATED_STUDENT: &[Party] = &[Party::EvaluatedStudent];
const ADMIN: &[Party] = &[Party::Admin];
const SYSTEM: &[Party] = &[Party::System];

const NONE: &[Effect] = &[];
const NOTIFY_UNDER_REVIEW: &[Effect] = &[Effect::Notify(
    Audience::Student,
    NotificationKind::ApplicationUnderReview,
)];
const ACCEPT: &[Effect] = &[
    Effect::PlaceStudent,
    Effect::Notify(Audience::Student, NotificationKind::ApplicationAccepted),
];
const NOTIFY_REJECTED: &[Effect] = &[Effect::Notify(
    Audience::Student,
    NotificationKind::ApplicationRejected,
)];
const START: &[Effect] = &[Effect::Notify(
    Audience::Student,
    NotificationKind::InternshipStarted,
)];
const COMPLETE: &[Effect] = &[Effect::PromptFinalEvaluations];
const CANCEL: &[Effect] = &[
    Effect::CloseDependents,
    Effect::Notify(Audience::Student, NotificationKind::InternshipCancelled),
];
const NOTIFY_LOGBOOK_SUBMITTED: &[Effect] = &[Effect::Notify(
    Audience::Supervisor,
    NotificationKind::LogbookSubmitted,
)];
const NOTIFY_LOGBOOK_APPROVED: &[Effect] = &[Effect::Notify(
    Audience::Student,
    NotificationKind::LogbookApproved,
)];
const NOTIFY_LOGBOOK_REVISION: &[Effect] = &[Effect::Notify(
    Audience::Student,
    NotificationKind::LogbookRevisionRequested,
)];
const APPROVE_ATTENDANCE: &[Effect] = &[
    Effect::CreditHours,
    Effect::Notify(Audience::Student, NotificationKind::AttendanceApproved),
];
const NOTIFY_ATTENDANCE_REJECTED: &[Effect] = &[Effect::Notify(
    Audience::Student,
    NotificationKind::AttendanceRejected,
)];
const NOTIFY_EVALUATION_SUBMITTED: &[Effect] = &[Effect::Notify(
    Audience::Student,
    NotificationKind::EvaluationSubmitted,
)];

const fn rule(
    from: Status,
    to: Status,
    parties: &'static [Party],
    gate: Gate,
    effects: &'static [Effect],
) -> TransitionRule {
    TransitionRule {
        from,
        to,
        parties,
        gate,
        effects,
    }
}

const fn application(
    from: App,
    to: App,
    parties: &'static [Party],
    effects: &'static [Effect],
) -> TransitionRule {
    rule(
        Status::Application(from),
        Status::Application(to),
        parties,
        Gate::Open,
        effects,
    )
}

const fn internship(
    from: Int,
    to: Int,
    parties: &'static [Party],
    gate: Gate,
    effects: &'static [Effect],
) -> TransitionRule {
    rule(
        Status::Internship(from),
        Status::Internship(to),
        parties,
        gate,
        effects,
    )
}

const fn logbook(
    from: Log,
    to: Log,
    parties: &'static [Party],
    effects: &'static [Effect],
) -> TransitionRule {
    rule(
        Status::LogbookEntry(from),
        Status::LogbookEntry(to),
        parties,
        Gate::Open,
        effects,
    )
}

const fn attendance(
    from: Att,
    to: Att,
    parties: &'static [Party],
    effects: &'static [Effect],
) -> TransitionRule {
    rule(
        Status::Attendance(from),
        Status::Attendance(to),
        parties,
        Gate::Open,
        effects,
    )
}

const fn evaluation(
    from: Eval,
    to: Eval,
    parties: &'static [Party],
    effects: &'static [Effect],
) -> TransitionRule {
    rule(
        Status::Evaluation(from),
        Status::Evaluation(to),
        parties,
        Gate::Open,
        effects,
    )
}

/// Every legal transition.
pub static TRANSITION_TABLE: &[TransitionRule] = &[
    // Applications.
    application(App::Pending, App::Reviewing, REVIEWERS, NOTIFY_UNDER_REVIEW),
    application(App::Reviewing, App::Accepted, REVIEWERS, ACCEPT),
    application(App::Reviewing, App::Rejected, REVIEWERS, NOTIFY_REJECTED),
    // Capacity cascades reject applications nobody has picked up yet.
    application(App::Pending, App::Rejected, SYSTEM, NOTIFY_REJECTED),
    application(App::Pending, App::Withdrawn, OWNING_STUDENT, NONE),
    application(App::Reviewing, App::Withdrawn, OWNING_STUDENT, NONE),
    // Internships.
    internship(Int::Upcoming, Int::Active, SYSTEM, Gate::StartDateReached, START),
    internship(Int::Active, Int::Completed, SYSTEM, Gate::EndDatePassed, COMPLETE),
    internship(Int::Upcoming, Int::Cancelled, ADMIN, Gate::Open, CANCEL),
    internship(Int::Active, Int::Cancelled, ADMIN, Gate::Open, CANCEL),
    // Logbook entries.
    logbook(Log::Draft, Log::Pending, OWNING_STUDENT, NOTIFY_LOGBOOK_SUBMITTED),
    logbook(Log::Pending, Log::Approved, ASSIGNED_DOCTOR, NOTIFY_LOGBOOK_APPROVED),
    logbook(
        Log::Pending,
        Log::RevisionRequested,
        ASSIGNED_DOCTOR,
        NOTIFY_LOGBOOK_REVISION,
    ),
    logbook(
        Log::RevisionRequested,
        Log::Pending,
        OWNING_STUDENT,
        NOTIFY_LOGBOOK_SUBMITTED,
    ),
    logbook(Log::Draft, Log::Cancelled, SYSTEM, NONE),
    logbook(Log::Pending, Log::Cancelled, SYSTEM, NONE),
    logbook(Log::RevisionRequested, Log::Cancelled, SYSTEM, NONE),
    // Attendance.
    attendance(Att::Pending, Att::Approved, ASSIGNED_DOCTOR, APPROVE_ATTENDANCE),
    attendance(Att::Present, Att::Approved, ASSIGNED_DOCTOR, APPROVE_ATTENDANCE),
    attendance(Att::Absent, Att::Approved, ASSIGNED_DOCTOR, APPROVE_ATTENDANCE),
    attendance(Att::Late, Att::Approved, ASSIGNED_DOCTOR, APPROVE_ATTENDANCE),
    attendance(Att::Excused, Att::Approved, ASSIGNED_DOCTOR, APPROVE_ATTENDANCE),
    attendance(Att::Pending, Att::Rejected, ASSIGNED_DOCTOR, NOTIFY_ATTENDANCE_REJECTED),
    attendance(Att::Present, Att::Rejected, ASSIGNED_DOCTOR, NOTIFY_ATTENDANCE_REJECTED),
    attendance(Att::Absent, Att::Rejected, ASSIGNED_DOCTOR, NOTIFY_ATTENDANCE_REJECTED),
    attendance(Att::Late, Att::Rejected, ASSIGNED_DOCTOR, NOTIFY_ATTENDANCE_REJECTED),
    attendance(Att::Excused, Att::Rejected, ASSIGNED_DOCTOR, NOTIFY_ATTENDANCE_REJECTED),
    // Evaluations.
    evaluation(Eval::Draft, Eval::Submitted, EVALUATOR, NOTIFY_EVALUATION_SUBMITTED),
    evaluation(Eval::Submitted, Eval::Acknowledged, EVALUATED_STUDENT, NONE),
    evaluation(Eval::Draft, Eval::Cancelled, SYSTEM, NONE),
    evaluation(Eval::Submitted, Eval::Cancelled, SYSTEM, NONE),
];

/// Looks up the row for a `(from, to)` pair.
#[must_use]
pub fn rule_for(from: Status, to: Status) -> Option<&'static TransitionRule> {
    TRANSITION_TABLE
        .iter()
        .find(|rule| rule.from == from && rule.to == to)
}

/// Returns every row leaving `from`.
pub fn outbound(from: Status) -> impl Iterator<Item = &'static TransitionRule> {
    TRANSITION_TABLE.iter().filter(move |rule| rule.from == from)
}
