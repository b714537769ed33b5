//! Diesel row models for placement persistence, with conversions to and from
//! the domain.

use super::schema::{
    applications, attendance_records, evaluations, internships, logbook_entries,
    notification_outbox, offers,
};
use crate::placement::{
    domain::{
        Application, ApplicationId, ApplicationStatus, Attendance, AttendanceId, AttendanceStatus,
        EntityRef, Evaluation, EvaluationId, EvaluationStatus, EvaluationType, Internship,
        InternshipId, InternshipStatus, LogbookEntry, LogbookEntryId, LogbookStatus, Notification,
        NotificationId, NotificationKind, Offer, OfferId, PersistedApplicationData,
        PersistedAttendanceData, PersistedEvaluationData, PersistedInternshipData,
        PersistedLogbookEntryData, PersistedOfferData, Revision, UserId,
    },
    ports::{StoreError, StoreResult},
};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

/// Offer row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = offers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OfferRow {
    /// Offer identifier.
    pub id: Uuid,
    /// Publishing hospital.
    pub hospital_id: Uuid,
    /// Supervising doctor.
    pub supervisor_id: Uuid,
    /// Offer title.
    pub title: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Total positions.
    pub positions: i32,
    /// Consumed positions.
    pub filled_positions: i32,
    /// Optimistic-lock version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Application row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = applications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ApplicationRow {
    /// Application identifier.
    pub id: Uuid,
    /// Applying student.
    pub student_id: Uuid,
    /// Target offer.
    pub offer_id: Uuid,
    /// Review status.
    pub status: String,
    /// Rejection reason.
    pub rejection_reason: Option<String>,
    /// Optimistic-lock version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Internship row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = internships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InternshipRow {
    /// Internship identifier.
    pub id: Uuid,
    /// Accepted application.
    pub application_id: Uuid,
    /// Placed student.
    pub student_id: Uuid,
    /// Host hospital.
    pub hospital_id: Uuid,
    /// Supervising doctor.
    pub supervisor_id: Uuid,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Lifecycle status.
    pub status: String,
    /// Credited hours.
    pub credited_hours: i32,
    /// Optimistic-lock version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Logbook entry row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = logbook_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct LogbookEntryRow {
    /// Entry identifier.
    pub id: Uuid,
    /// Owning internship.
    pub internship_id: Uuid,
    /// Authoring student.
    pub student_id: Uuid,
    /// Day covered.
    pub entry_date: NaiveDate,
    /// Activities performed.
    pub activities: String,
    /// Review status.
    pub status: String,
    /// Supervisor feedback.
    pub supervisor_comments: Option<String>,
    /// Optimistic-lock version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Attendance row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = attendance_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AttendanceRow {
    /// Record identifier.
    pub id: Uuid,
    /// Owning internship.
    pub internship_id: Uuid,
    /// Attending student.
    pub student_id: Uuid,
    /// Day attended.
    pub attendance_date: NaiveDate,
    /// Hours attended.
    pub hours: i32,
    /// Attendance status.
    pub status: String,
    /// Optimistic-lock version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Evaluation row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = evaluations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct EvaluationRow {
    /// Evaluation identifier.
    pub id: Uuid,
    /// Owning internship.
    pub internship_id: Uuid,
    /// Evaluated student.
    pub student_id: Uuid,
    /// Authoring doctor or tutor.
    pub evaluator_id: Uuid,
    /// Evaluation type.
    pub evaluation_type: String,
    /// Evaluation status.
    pub status: String,
    /// Percentage score.
    pub score: Option<i16>,
    /// Free-text comments.
    pub comments: Option<String>,
    /// Optimistic-lock version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Outbox row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = notification_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    /// Notification identifier.
    pub id: Uuid,
    /// Recipient.
    pub recipient_id: Uuid,
    /// Notification kind.
    pub kind: String,
    /// Subject reference.
    pub subject: Value,
    /// Payload.
    pub payload: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Hand-off timestamp.
    pub dispatched_at: Option<DateTime<Utc>>,
}

fn to_i32(value: u32) -> StoreResult<i32> {
    i32::try_from(value).map_err(StoreError::persistence)
}

fn to_u32(value: i32) -> StoreResult<u32> {
    u32::try_from(value).map_err(StoreError::persistence)
}

/// Converts a domain version to its column value.
pub(super) fn to_i64(value: u64) -> StoreResult<i64> {
    i64::try_from(value).map_err(StoreError::persistence)
}

fn revision(
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> StoreResult<Revision> {
    Ok(Revision {
        version: u64::try_from(version).map_err(StoreError::persistence)?,
        created_at,
        updated_at,
    })
}

impl OfferRow {
    /// Builds a row from a domain offer.
    pub fn from_domain(offer: &Offer) -> StoreResult<Self> {
        let revision = offer.revision();
        Ok(Self {
            id: offer.id().into_inner(),
            hospital_id: offer.hospital_id().into_inner(),
            supervisor_id: offer.supervisor_id().into_inner(),
            title: offer.title().to_owned(),
            start_date: offer.start_date(),
            end_date: offer.end_date(),
            positions: to_i32(offer.positions())?,
            filled_positions: to_i32(offer.filled_positions())?,
            version: to_i64(revision.version)?,
            created_at: revision.created_at,
            updated_at: revision.updated_at,
        })
    }

    /// Rebuilds the domain offer.
    pub fn into_domain(self) -> StoreResult<Offer> {
        Ok(Offer::from_persisted(PersistedOfferData {
            id: OfferId::from_uuid(self.id),
            hospital_id: UserId::from_uuid(self.hospital_id),
            supervisor_id: UserId::from_uuid(self.supervisor_id),
            title: self.title,
            start_date: self.start_date,
            end_date: self.end_date,
            positions: to_u32(self.positions)?,
            filled_positions: to_u32(self.filled_positions)?,
            revision: revision(self.version, self.created_at, self.updated_at)?,
        }))
    }
}

impl ApplicationRow {
    /// Builds a row from a domain application.
    pub fn from_domain(application: &Application) -> StoreResult<Self> {
        let revision = application.revision();
        Ok(Self {
            id: application.id().into_inner(),
            student_id: application.student_id().into_inner(),
            offer_id: application.offer_id().into_inner(),
            status: application.status().as_str().to_owned(),
            rejection_reason: application.rejection_reason().map(str::to_owned),
            version: to_i64(revision.version)?,
            created_at: revision.created_at,
            updated_at: revision.updated_at,
        })
    }

    /// Rebuilds the domain application.
    pub fn into_domain(self) -> StoreResult<Application> {
        let status =
            ApplicationStatus::try_from(self.status.as_str()).map_err(StoreError::persistence)?;
        Ok(Application::from_persisted(PersistedApplicationData {
            id: ApplicationId::from_uuid(self.id),
            student_id: UserId::from_uuid(self.student_id),
            offer_id: OfferId::from_uuid(self.offer_id),
            status,
            rejection_reason: self.rejection_reason,
            revision: revision(self.version, self.created_at, self.updated_at)?,
        }))
    }
}

impl InternshipRow {
    /// Builds a row from a domain internship.
    pub fn from_domain(internship: &Internship) -> StoreResult<Self> {
        let revision = internship.revision();
        Ok(Self {
            id: internship.id().into_inner(),
            application_id: internship.application_id().into_inner(),
            student_id: internship.student_id().into_inner(),
            hospital_id: internship.hospital_id().into_inner(),
            supervisor_id: internship.supervisor_id().into_inner(),
            start_date: internship.start_date(),
            end_date: internship.end_date(),
            status: internship.status().as_str().to_owned(),
            credited_hours: to_i32(internship.credited_hours())?,
            version: to_i64(revision.version)?,
            created_at: revision.created_at,
            updated_at: revision.updated_at,
        })
    }

    /// Rebuilds the domain internship.
    pub fn into_domain(self) -> StoreResult<Internship> {
        let status =
            InternshipStatus::try_from(self.status.as_str()).map_err(StoreError::persistence)?;
        Ok(Internship::from_persisted(PersistedInternshipData {
            id: InternshipId::from_uuid(self.id),
            application_id: ApplicationId::from_uuid(self.application_id),
            student_id: UserId::from_uuid(self.student_id),
            hospital_id: UserId::from_uuid(self.hospital_id),
            supervisor_id: UserId::from_uuid(self.supervisor_id),
            start_date: self.start_date,
            end_date: self.end_date,
            status,
            credited_hours: to_u32(self.credited_hours)?,
            revision: revision(self.version, self.created_at, self.updated_at)?,
        }))
    }
}

impl LogbookEntryRow {
    /// Builds a row from a domain logbook entry.
    pub fn from_domain(entry: &LogbookEntry) -> StoreResult<Self> {
        let revision = entry.revision();
        Ok(Self {
            id: entry.id().into_inner(),
            internship_id: entry.internship_id().into_inner(),
            student_id: entry.student_id().into_inner(),
            entry_date: entry.date(),
            activities: entry.activities().to_owned(),
            status: entry.status().as_str().to_owned(),
            supervisor_comments: entry.supervisor_comments().map(str::to_owned),
            version: to_i64(revision.version)?,
            created_at: revision.created_at,
            updated_at: revision.updated_at,
        })
    }

    /// Rebuilds the domain logbook entry.
    pub fn into_domain(self) -> StoreResult<LogbookEntry> {
        let status =
            LogbookStatus::try_from(self.status.as_str()).map_err(StoreError::persistence)?;
        Ok(LogbookEntry::from_persisted(PersistedLogbookEntryData {
            id: LogbookEntryId::from_uuid(self.id),
            internship_id: InternshipId::from_uuid(self.internship_id),
            student_id: UserId::from_uuid(self.student_id),
            date: self.entry_date,
            activities: self.activities,
            status,
            supervisor_comments: self.supervisor_comments,
            revision: revision(self.version, self.created_at, self.updated_at)?,
        }))
    }
}

impl AttendanceRow {
    /// Builds a row from a domain attendance record.
    pub fn from_domain(attendance: &Attendance) -> StoreResult<Self> {
        let revision = attendance.revision();
        Ok(Self {
            id: attendance.id().into_inner(),
            internship_id: attendance.internship_id().into_inner(),
            student_id: attendance.student_id().into_inner(),
            attendance_date: attendance.date(),
            hours: to_i32(attendance.hours())?,
            status: attendance.status().as_str().to_owned(),
            version: to_i64(revision.version)?,
            created_at: revision.created_at,
            updated_at: revision.updated_at,
        })
    }

    /// Rebuilds the domain attendance record.
    pub fn into_domain(self) -> StoreResult<Attendance> {
        let status =
            AttendanceStatus::try_from(self.status.as_str()).map_err(StoreError::persistence)?;
        Ok(Attendance::from_persisted(PersistedAttendanceData {
            id: AttendanceId::from_uuid(self.id),
            internship_id: InternshipId::from_uuid(self.internship_id),
            student_id: UserId::from_uuid(self.student_id),
            date: self.attendance_date,
            hours: to_u32(self.hours)?,
            status,
            revision: revision(self.version, self.created_at, self.updated_at)?,
        }))
    }
}

impl EvaluationRow {
    /// Builds a row from a domain evaluation.
    pub fn from_domain(evaluation: &Evaluation) -> StoreResult<Self> {
        let revision = evaluation.revision();
        Ok(Self {
            id: evaluation.id().into_inner(),
            internship_id: evaluation.internship_id().into_inner(),
            student_id: evaluation.student_id().into_inner(),
            evaluator_id: evaluation.evaluator_id().into_inner(),
            evaluation_type: evaluation.evaluation_type().as_str().to_owned(),
            status: evaluation.status().as_str().to_owned(),
            score: evaluation.score().map(i16::from),
            comments: evaluation.comments().map(str::to_owned),
            version: to_i64(revision.version)?,
            created_at: revision.created_at,
            updated_at: revision.updated_at,
        })
    }

    /// Rebuilds the domain evaluation.
    pub fn into_domain(self) -> StoreResult<Evaluation> {
        let status =
            EvaluationStatus::try_from(self.status.as_str()).map_err(StoreError::persistence)?;
        let evaluation_type = EvaluationType::try_from(self.evaluation_type.as_str())
            .map_err(StoreError::persistence)?;
        let score = self
            .score
            .map(u8::try_from)
            .transpose()
            .map_err(StoreError::persistence)?;
        Ok(Evaluation::from_persisted(PersistedEvaluationData {
            id: EvaluationId::from_uuid(self.id),
            internship_id: InternshipId::from_uuid(self.internship_id),
            student_id: UserId::from_uuid(self.student_id),
            evaluator_id: UserId::from_uuid(self.evaluator_id),
            evaluation_type,
            status,
            score,
            comments: self.comments,
            revision: revision(self.version, self.created_at, self.updated_at)?,
        }))
    }
}

impl NotificationRow {
    /// Builds a row from a domain notification.
    pub fn from_domain(notification: &Notification) -> StoreResult<Self> {
        Ok(Self {
            id: notification.id.into_inner(),
            recipient_id: notification.recipient_id.into_inner(),
            kind: notification.kind.as_str().to_owned(),
            subject: serde_json::to_value(notification.subject)
                .map_err(StoreError::persistence)?,
            payload: notification.payload.clone(),
            created_at: notification.created_at,
            dispatched_at: notification.dispatched_at,
        })
    }

    /// Rebuilds the domain notification.
    pub fn into_domain(self) -> StoreResult<Notification> {
        let kind = NotificationKind::try_from(self.kind.as_str()).map_err(StoreError::persistence)?;
        let subject =
            serde_json::from_value::<EntityRef>(self.subject).map_err(StoreError::persistence)?;
        Ok(Notification {
            id: NotificationId::from_uuid(self.id),
            recipient_id: UserId::from_uuid(self.recipient_id),
            kind,
            subject,
            payload: self.payload,
            created_at: self.created_at,
            dispatched_at: self.dispatched_at,
        })
    }
}
