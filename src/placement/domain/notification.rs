//! Notification requests recorded in the outbox.

use super::{EntityRef, NotificationId, ParseNotificationKindError, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of notification emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A reviewer picked up the application.
    ApplicationUnderReview,
    /// The application was accepted.
    ApplicationAccepted,
    /// The application was rejected.
    ApplicationRejected,
    /// The internship started.
    InternshipStarted,
    /// The internship was cancelled.
    InternshipCancelled,
    /// The internship ended; final evaluations must be finalised.
    FinalEvaluationDue,
    /// A logbook entry awaits supervisor review.
    LogbookSubmitted,
    /// A logbook entry was approved.
    LogbookApproved,
    /// A logbook entry needs revision.
    LogbookRevisionRequested,
    /// An attendance record was approved.
    AttendanceApproved,
    /// An attendance record was rejected.
    AttendanceRejected,
    /// An evaluation awaits acknowledgement.
    EvaluationSubmitted,
}

impl NotificationKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApplicationUnderReview => "application_under_review",
            Self::ApplicationAccepted => "application_accepted",
            Self::ApplicationRejected => "application_rejected",
            Self::InternshipStarted => "internship_started",
            Self::InternshipCancelled => "internship_cancelled",
            Self::FinalEvaluationDue => "final_evaluation_due",
            Self::LogbookSubmitted => "logbook_submitted",
            Self::LogbookApproved => "logbook_approved",
            Self::LogbookRevisionRequested => "logbook_revision_requested",
            Self::AttendanceApproved => "attendance_approved",
            Self::AttendanceRejected => "attendance_rejected",
            Self::EvaluationSubmitted => "evaluation_submitted",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for NotificationKind {
    type Error = ParseNotificationKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        serde_json::from_value(Value::String(value.trim().to_ascii_lowercase()))
            .map_err(|_| ParseNotificationKindError(value.to_owned()))
    }
}

/// Notification addressed to one user, persisted with the transition that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Outbox identifier.
    pub id: NotificationId,
    /// Receiving user.
    pub recipient_id: UserId,
    /// Notification kind.
    pub kind: NotificationKind,
    /// Entity the notification is about.
    pub subject: EntityRef,
    /// Kind-specific details.
    pub payload: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set once the notification service accepted the request.
    pub dispatched_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Creates an undispatched notification.
    #[must_use]
    pub fn new(
        recipient_id: UserId,
        kind: NotificationKind,
        subject: EntityRef,
        payload: Value,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            recipient_id,
            kind,
            subject,
            payload,
            created_at: clock.utc(),
            dispatched_at: None,
        }
    }

    /// Returns `true` once handed to the notification service.
    #[must_use]
    pub const fn is_dispatched(&self) -> bool {
        self.dispatched_at.is_some()
    }
}
