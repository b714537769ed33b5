//! `PostgreSQL` store implementation for placement workflow storage.

use super::{
    models::{
        ApplicationRow, AttendanceRow, EvaluationRow, InternshipRow, LogbookEntryRow,
        NotificationRow, OfferRow, to_i64,
    },
    schema::{
        applications, attendance_records, evaluations, internships, logbook_entries,
        notification_outbox, offers,
    },
};
use crate::placement::{
    domain::{
        Application, ChangeSet, Entity, EntityRef, EntityWrite, Internship, InternshipId,
        InternshipStatus, Notification, NotificationId, Offer, OfferId, OfferWrite, UserId,
    },
    ports::{PlacementStore, StoreError, StoreResult},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by placement adapters.
pub type PlacementPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed placement store.
#[derive(Debug, Clone)]
pub struct PostgresPlacementStore {
    pool: PlacementPgPool,
}

impl PostgresPlacementStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PlacementPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(StoreError::persistence)?
    }
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// Row images of a change set, converted before entering the blocking pool.
enum RowWrite {
    Application(ApplicationRow),
    Internship(InternshipRow),
    LogbookEntry(LogbookEntryRow),
    Attendance(AttendanceRow),
    Evaluation(EvaluationRow),
}

struct StagedWrite {
    label: String,
    row: RowWrite,
    expected_version: Option<i64>,
}

struct StagedOffer {
    row: OfferRow,
    expected_version: Option<i64>,
}

fn stage_entity(write: &EntityWrite) -> StoreResult<StagedWrite> {
    let (entity, expected_version) = match write {
        EntityWrite::Insert(entity) => (entity, None),
        EntityWrite::Update {
            entity,
            expected_version,
        } => (entity, Some(to_i64(*expected_version)?)),
    };
    let row = match entity {
        Entity::Application(inner) => RowWrite::Application(ApplicationRow::from_domain(inner)?),
        Entity::Internship(inner) => RowWrite::Internship(InternshipRow::from_domain(inner)?),
        Entity::LogbookEntry(inner) => {
            RowWrite::LogbookEntry(LogbookEntryRow::from_domain(inner)?)
        }
        Entity::Attendance(inner) => RowWrite::Attendance(AttendanceRow::from_domain(inner)?),
        Entity::Evaluation(inner) => RowWrite::Evaluation(EvaluationRow::from_domain(inner)?),
    };
    Ok(StagedWrite {
        label: entity.entity_ref().to_string(),
        row,
        expected_version,
    })
}

fn stage_offer(write: &OfferWrite) -> StoreResult<StagedOffer> {
    match write {
        OfferWrite::Insert(offer) => Ok(StagedOffer {
            row: OfferRow::from_domain(offer)?,
            expected_version: None,
        }),
        OfferWrite::Update {
            offer,
            expected_version,
        } => Ok(StagedOffer {
            row: OfferRow::from_domain(offer)?,
            expected_version: Some(to_i64(*expected_version)?),
        }),
    }
}

fn map_insert_error(err: DieselError, label: &str) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::Duplicate(label.to_owned())
        }
        other => StoreError::persistence(other),
    }
}

/// Turns the affected-row count of a version-guarded update into a result.
fn check_updated(affected: usize, exists: bool, label: &str) -> StoreResult<()> {
    match (affected, exists) {
        (0, true) => Err(StoreError::Conflict(label.to_owned())),
        (0, false) => Err(StoreError::NotFound(label.to_owned())),
        _ => Ok(()),
    }
}

macro_rules! write_row {
    ($connection:expr, $table:ident, $row:expr, $expected:expr, $label:expr) => {{
        let staged_row = $row;
        match $expected {
            None => diesel::insert_into($table::table)
                .values(staged_row)
                .execute($connection)
                .map(|_| ())
                .map_err(|err| map_insert_error(err, $label)),
            Some(expected_version) => {
                let affected = diesel::update(
                    $table::table
                        .filter($table::id.eq(staged_row.id))
                        .filter($table::version.eq(expected_version)),
                )
                .set(staged_row)
                .execute($connection)?;
                let exists = affected > 0
                    || diesel::select(diesel::dsl::exists(
                        $table::table.filter($table::id.eq(staged_row.id)),
                    ))
                    .get_result::<bool>($connection)?;
                check_updated(affected, exists, $label)
            }
        }
    }};
}

fn apply_write(connection: &mut PgConnection, write: &StagedWrite) -> StoreResult<()> {
    let label = write.label.as_str();
    let expected = write.expected_version;
    match &write.row {
        RowWrite::Application(row) => write_row!(connection, applications, row, expected, label),
        RowWrite::Internship(row) => write_row!(connection, internships, row, expected, label),
        RowWrite::LogbookEntry(row) => {
            write_row!(connection, logbook_entries, row, expected, label)
        }
        RowWrite::Attendance(row) => {
            write_row!(connection, attendance_records, row, expected, label)
        }
        RowWrite::Evaluation(row) => write_row!(connection, evaluations, row, expected, label),
    }
}

fn apply_offer(connection: &mut PgConnection, write: &StagedOffer) -> StoreResult<()> {
    let label = format!("offer/{}", write.row.id);
    write_row!(
        connection,
        offers,
        &write.row,
        write.expected_version,
        label.as_str()
    )
}

fn load_entity(connection: &mut PgConnection, entity: EntityRef) -> StoreResult<Option<Entity>> {
    let id = entity.uuid();
    let found = match entity {
        EntityRef::Application(_) => applications::table
            .find(id)
            .select(ApplicationRow::as_select())
            .first::<ApplicationRow>(connection)
            .optional()?
            .map(|row| row.into_domain().map(Entity::from))
            .transpose()?,
        EntityRef::Internship(_) => load_internship(connection, id)?.map(Entity::from),
        EntityRef::LogbookEntry(_) => logbook_entries::table
            .find(id)
            .select(LogbookEntryRow::as_select())
            .first::<LogbookEntryRow>(connection)
            .optional()?
            .map(|row| row.into_domain().map(Entity::from))
            .transpose()?,
        EntityRef::Attendance(_) => attendance_records::table
            .find(id)
            .select(AttendanceRow::as_select())
            .first::<AttendanceRow>(connection)
            .optional()?
            .map(|row| row.into_domain().map(Entity::from))
            .transpose()?,
        EntityRef::Evaluation(_) => evaluations::table
            .find(id)
            .select(EvaluationRow::as_select())
            .first::<EvaluationRow>(connection)
            .optional()?
            .map(|row| row.into_domain().map(Entity::from))
            .transpose()?,
    };
    Ok(found)
}

fn load_internship(connection: &mut PgConnection, id: Uuid) -> StoreResult<Option<Internship>> {
    internships::table
        .find(id)
        .select(InternshipRow::as_select())
        .first::<InternshipRow>(connection)
        .optional()?
        .map(InternshipRow::into_domain)
        .transpose()
}

fn select_internships(
    connection: &mut PgConnection,
    status: InternshipStatus,
    starting_by: Option<NaiveDate>,
    ended_before: Option<NaiveDate>,
) -> StoreResult<Vec<Internship>> {
    let mut query = internships::table
        .filter(internships::status.eq(status.as_str()))
        .select(InternshipRow::as_select())
        .order((internships::start_date.asc(), internships::id.asc()))
        .into_boxed();
    if let Some(today) = starting_by {
        query = query.filter(internships::start_date.le(today));
    }
    if let Some(today) = ended_before {
        query = query.filter(internships::end_date.lt(today));
    }
    query
        .load::<InternshipRow>(connection)?
        .into_iter()
        .map(InternshipRow::into_domain)
        .collect()
}

#[async_trait]
impl PlacementStore for PostgresPlacementStore {
    async fn find_entity(&self, entity: EntityRef) -> StoreResult<Option<Entity>> {
        self.run_blocking(move |connection| load_entity(connection, entity))
            .await
    }

    async fn find_offer(&self, id: OfferId) -> StoreResult<Option<Offer>> {
        self.run_blocking(move |connection| {
            offers::table
                .find(id.into_inner())
                .select(OfferRow::as_select())
                .first::<OfferRow>(connection)
                .optional()?
                .map(OfferRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn applications_for_offer(&self, offer_id: OfferId) -> StoreResult<Vec<Application>> {
        self.run_blocking(move |connection| {
            applications::table
                .filter(applications::offer_id.eq(offer_id.into_inner()))
                .select(ApplicationRow::as_select())
                .order((applications::created_at.asc(), applications::id.asc()))
                .load::<ApplicationRow>(connection)?
                .into_iter()
                .map(ApplicationRow::into_domain)
                .collect()
        })
        .await
    }

    async fn dependents_of(&self, internship_id: InternshipId) -> StoreResult<Vec<Entity>> {
        let id = internship_id.into_inner();
        self.run_blocking(move |connection| {
            let mut dependents = Vec::new();
            for row in logbook_entries::table
                .filter(logbook_entries::internship_id.eq(id))
                .select(LogbookEntryRow::as_select())
                .order(logbook_entries::created_at.asc())
                .load::<LogbookEntryRow>(connection)?
            {
                dependents.push(Entity::from(row.into_domain()?));
            }
            for row in attendance_records::table
                .filter(attendance_records::internship_id.eq(id))
                .select(AttendanceRow::as_select())
                .order(attendance_records::created_at.asc())
                .load::<AttendanceRow>(connection)?
            {
                dependents.push(Entity::from(row.into_domain()?));
            }
            for row in evaluations::table
                .filter(evaluations::internship_id.eq(id))
                .select(EvaluationRow::as_select())
                .order(evaluations::created_at.asc())
                .load::<EvaluationRow>(connection)?
            {
                dependents.push(Entity::from(row.into_domain()?));
            }
            Ok(dependents)
        })
        .await
    }

    async fn internships_due_to_start(&self, today: NaiveDate) -> StoreResult<Vec<Internship>> {
        self.run_blocking(move |connection| {
            select_internships(connection, InternshipStatus::Upcoming, Some(today), None)
        })
        .await
    }

    async fn internships_due_to_complete(
        &self,
        today: NaiveDate,
    ) -> StoreResult<Vec<Internship>> {
        self.run_blocking(move |connection| {
            select_internships(connection, InternshipStatus::Active, None, Some(today))
        })
        .await
    }

    async fn commit(&self, change_set: &ChangeSet) -> StoreResult<()> {
        let entity_writes = change_set
            .entity_writes()
            .iter()
            .map(stage_entity)
            .collect::<StoreResult<Vec<_>>>()?;
        let offer_writes = change_set
            .offer_writes()
            .iter()
            .map(stage_offer)
            .collect::<StoreResult<Vec<_>>>()?;
        let notifications = change_set
            .notifications()
            .iter()
            .map(NotificationRow::from_domain)
            .collect::<StoreResult<Vec<_>>>()?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, StoreError, _>(|tx| {
                for write in &offer_writes {
                    apply_offer(tx, write)?;
                }
                for write in &entity_writes {
                    apply_write(tx, write)?;
                }
                if !notifications.is_empty() {
                    diesel::insert_into(notification_outbox::table)
                        .values(&notifications)
                        .execute(tx)
                        .map_err(|err| map_insert_error(err, "notification"))?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn undispatched_notifications(&self, limit: usize) -> StoreResult<Vec<Notification>> {
        let row_limit = i64::try_from(limit).map_err(StoreError::persistence)?;
        self.run_blocking(move |connection| {
            notification_outbox::table
                .filter(notification_outbox::dispatched_at.is_null())
                .select(NotificationRow::as_select())
                .order(notification_outbox::created_at.asc())
                .limit(row_limit)
                .load::<NotificationRow>(connection)?
                .into_iter()
                .map(NotificationRow::into_domain)
                .collect()
        })
        .await
    }

    async fn mark_dispatched(
        &self,
        ids: &[NotificationId],
        dispatched_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        self.run_blocking(move |connection| {
            diesel::update(
                notification_outbox::table
                    .filter(notification_outbox::id.eq_any(uuids))
                    .filter(notification_outbox::dispatched_at.is_null()),
            )
            .set(notification_outbox::dispatched_at.eq(Some(dispatched_at)))
            .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn notifications_for(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        self.run_blocking(move |connection| {
            notification_outbox::table
                .filter(notification_outbox::recipient_id.eq(recipient.into_inner()))
                .select(NotificationRow::as_select())
                .order(notification_outbox::created_at.asc())
                .load::<NotificationRow>(connection)?
                .into_iter()
                .map(NotificationRow::into_domain)
                .collect()
        })
        .await
    }
}
