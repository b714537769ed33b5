//! Evaluations written by doctors and tutors.

use super::{
    EvaluationId, EvaluationStatus, EvaluationType, Internship, InternshipId,
    PlacementDomainError, Revision, UserId,
};
use mockable::Clock;
use serde::{Deserialize, Serialize};

const MAX_SCORE: u8 = 100;

/// Evaluation aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    id: EvaluationId,
    internship_id: InternshipId,
    student_id: UserId,
    evaluator_id: UserId,
    evaluation_type: EvaluationType,
    status: EvaluationStatus,
    score: Option<u8>,
    comments: Option<String>,
    revision: Revision,
}

/// Parameter object for reconstructing a persisted evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedEvaluationData {
    /// Evaluation identifier.
    pub id: EvaluationId,
    /// Evaluated internship.
    pub internship_id: InternshipId,
    /// Evaluated student.
    pub student_id: UserId,
    /// Writing doctor or tutor.
    pub evaluator_id: UserId,
    /// Cadence.
    pub evaluation_type: EvaluationType,
    /// Status.
    pub status: EvaluationStatus,
    /// Percentage score.
    pub score: Option<u8>,
    /// Evaluator comments.
    pub comments: Option<String>,
    /// Version and timestamps.
    pub revision: Revision,
}

impl Evaluation {
    /// Creates a draft evaluation of the internship's student.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementDomainError`] when the internship is closed or the
    /// score exceeds 100.
    pub fn draft(
        internship: &Internship,
        evaluator_id: UserId,
        evaluation_type: EvaluationType,
        score: Option<u8>,
        comments: Option<String>,
        clock: &impl Clock,
    ) -> Result<Self, PlacementDomainError> {
        if !internship.is_open() {
            return Err(PlacementDomainError::InternshipClosed {
                internship_id: internship.id(),
                status: internship.status(),
            });
        }
        if let Some(value) = score.filter(|value| *value > MAX_SCORE) {
            return Err(PlacementDomainError::InvalidScore(value));
        }

        Ok(Self {
            id: EvaluationId::new(),
            internship_id: internship.id(),
            student_id: internship.student_id(),
            evaluator_id,
            evaluation_type,
            status: EvaluationStatus::Draft,
            score,
            comments,
            revision: Revision::initial(clock),
        })
    }

    /// Reconstructs an evaluation from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedEvaluationData) -> Self {
        Self {
            id: data.id,
            internship_id: data.internship_id,
            student_id: data.student_id,
            evaluator_id: data.evaluator_id,
            evaluation_type: data.evaluation_type,
            status: data.status,
            score: data.score,
            comments: data.comments,
            revision: data.revision,
        }
    }

    /// Returns the evaluation identifier.
    #[must_use]
    pub const fn id(&self) -> EvaluationId {
        self.id
    }

    /// Returns the evaluated internship.
    #[must_use]
    pub const fn internship_id(&self) -> InternshipId {
        self.internship_id
    }

    /// Returns the evaluated student.
    #[must_use]
    pub const fn student_id(&self) -> UserId {
        self.student_id
    }

    /// Returns the evaluator.
    #[must_use]
    pub const fn evaluator_id(&self) -> UserId {
        self.evaluator_id
    }

    /// Returns the cadence.
    #[must_use]
    pub const fn evaluation_type(&self) -> EvaluationType {
        self.evaluation_type
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> EvaluationStatus {
        self.status
    }

    /// Returns the score, if graded.
    #[must_use]
    pub const fn score(&self) -> Option<u8> {
        self.score
    }

    /// Returns the evaluator comments.
    #[must_use]
    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    /// Returns the version and timestamps.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Returns `true` for final evaluations that still await completion.
    #[must_use]
    pub fn is_outstanding_final(&self) -> bool {
        self.evaluation_type == EvaluationType::Final
            && matches!(
                self.status,
                EvaluationStatus::Draft | EvaluationStatus::Submitted
            )
    }

    pub(crate) fn set_status(&mut self, status: EvaluationStatus, clock: &impl Clock) {
        self.status = status;
        self.revision.bump(clock);
    }
}
