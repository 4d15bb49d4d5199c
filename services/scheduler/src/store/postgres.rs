//! Postgres-backed implementation of the scheduler store.
//!
//! # What this module is
//! This module implements the `SchedulerStore` trait using Postgres (via
//! `sqlx`) as the durable, shared backing store for scheduling state: bands,
//! membership rows, rehearsals with their agenda items, availability and
//! attendance declarations, and the append-only notification log.
//!
//! # Key invariants
//! - A rehearsal and its agenda items are written in one transaction; a band
//!   and its founding manager membership likewise.
//! - Availability and attendance writes are single
//!   `INSERT ... ON CONFLICT ... DO UPDATE` statements, so concurrent calls
//!   for the same `(user, rehearsal)` pair converge to one row and a
//!   duplicate-key error never escapes.
//! - Rehearsal patches apply as one conditional `UPDATE`: the resulting
//!   `(start_time, end_time)` pair is re-evaluated inside the statement's
//!   `WHERE` clause, so a racing update that would combine into an inverted
//!   range matches no row and surfaces as a conflict instead of corrupting
//!   the stored range. The table-level CHECK constraint backs this up.
//!
//! # Concurrency model
//! The store is shared across async handlers; `sqlx::PgPool` manages
//! connection concurrency. `acquire_timeout` bounds how long a request waits
//! for a pooled connection; exceeding it surfaces as a transient error so
//! callers can retry rather than hang.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")` so
//!   handlers can assume the schema exists.
//! - Database URLs may contain credentials; avoid logging them.
//! - Enum-valued columns store the wire strings; parsing back into the closed
//!   enums happens here and an unknown stored value is an internal error, not
//!   a caller error.
use super::{SchedulerStore, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{
    AgendaItem, Attendance, AttendanceStatus, Availability, AvailabilityStatus, Band, BandRole,
    BandSummary, Membership, MembershipStatus, Notification, NotificationKind, Rehearsal,
    RehearsalDetail, RehearsalPatch, RehearsalQuery, RehearsalStatus, RehearsalSummary,
    RehearsalWithItems,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_common::ids::{BandId, NotificationId, RehearsalId, UserId};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Durable scheduler store backed by Postgres.
///
/// # Errors
/// Connection and query failures surface as [`StoreError`]; pool acquisition
/// timeouts and I/O errors map to [`StoreError::Transient`].
///
/// # Example
/// ```rust,no_run
/// use scheduler::config::PostgresConfig;
/// use scheduler::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for the `bands` table.
///
/// DB-facing structs stay separate from the domain types so column names and
/// storage formats are isolated here, and so it is explicit where stored
/// strings are parsed back into the closed enums.
#[derive(Debug, Clone, FromRow)]
struct DbBand {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

/// Row shape for the `band_members` table.
#[derive(Debug, Clone, FromRow)]
struct DbMembership {
    band_id: Uuid,
    user_id: Uuid,
    role: String,
    status: String,
    joined_at: DateTime<Utc>,
}

/// Row shape for the `rehearsals` table.
#[derive(Debug, Clone, FromRow)]
struct DbRehearsal {
    id: Uuid,
    band_id: Uuid,
    title: String,
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    location: Option<String>,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row shape for the `agenda_items` table.
#[derive(Debug, Clone, FromRow)]
struct DbAgendaItem {
    rehearsal_id: Uuid,
    order_index: i32,
    title: String,
    description: Option<String>,
    duration_minutes: i32,
}

/// Row shape for the `availability` table.
#[derive(Debug, Clone, FromRow)]
struct DbAvailability {
    user_id: Uuid,
    rehearsal_id: Uuid,
    status: String,
    response_time: DateTime<Utc>,
}

/// Row shape for the `attendance` table.
#[derive(Debug, Clone, FromRow)]
struct DbAttendance {
    user_id: Uuid,
    rehearsal_id: Uuid,
    status: String,
    marked_at: DateTime<Utc>,
}

/// Row shape for the `notifications` table.
#[derive(Debug, Clone, FromRow)]
struct DbNotification {
    id: Uuid,
    user_id: Uuid,
    rehearsal_id: Uuid,
    kind: String,
    message: String,
    created_at: DateTime<Utc>,
}

/// Listing row: rehearsal columns joined with the band name and the viewer's
/// own availability status (NULL when the viewer has not responded).
#[derive(Debug, Clone, FromRow)]
struct DbRehearsalListing {
    id: Uuid,
    band_id: Uuid,
    title: String,
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    location: Option<String>,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    band_name: String,
    my_availability: Option<String>,
}

impl PostgresStore {
    /// Connect to Postgres and run embedded migrations.
    ///
    /// Migrations run before the store is handed out so handlers can assume
    /// the schema exists; a migration failure fails startup rather than
    /// serving partially functional endpoints.
    ///
    /// # Errors
    /// - Connection, migration, or pool setup failures.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        // Pool tuning: `max_connections` caps concurrent DB work and
        // `acquire_timeout` bounds how long a request waits for a pooled
        // connection before failing fast. Avoid logging `pg.url`; it may
        // contain credentials.
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|err| StoreError::Unexpected(err.into()))?;

        Ok(Self { pool })
    }

    async fn refresh_counts(&self) -> StoreResult<()> {
        let band_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bands")
            .fetch_one(&self.pool)
            .await?;
        metrics::gauge!("encore_bands_total").set(band_total as f64);

        let rehearsal_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rehearsals")
            .fetch_one(&self.pool)
            .await?;
        metrics::gauge!("encore_rehearsals_total").set(rehearsal_total as f64);
        Ok(())
    }
}

#[async_trait]
impl SchedulerStore for PostgresStore {
    /// Create a band and its founding manager membership in one transaction.
    async fn create_band(&self, band: Band, founder: Membership) -> StoreResult<Band> {
        let mut tx = self.pool.begin().await?;
        let insert = sqlx::query(r#"INSERT INTO bands (id, name, created_at) VALUES ($1, $2, $3)"#)
            .bind(band.id.as_uuid())
            .bind(&band.name)
            .bind(band.created_at)
            .execute(&mut *tx)
            .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict("band exists".into()));
            }
            return Err(err.into());
        }

        sqlx::query(
            r#"INSERT INTO band_members (band_id, user_id, role, status, joined_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(founder.band_id.as_uuid())
        .bind(founder.user_id.as_uuid())
        .bind(founder.role.as_str())
        .bind(founder.status.as_str())
        .bind(founder.joined_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.refresh_counts().await?;
        Ok(band)
    }

    async fn get_band(&self, band_id: BandId) -> StoreResult<Band> {
        let row = sqlx::query_as::<_, DbBand>(
            "SELECT id, name, created_at FROM bands WHERE id = $1",
        )
        .bind(band_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(band_from_db(row)),
            None => Err(StoreError::NotFound("band".into())),
        }
    }

    async fn band_exists(&self, band_id: BandId) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bands WHERE id = $1)")
            .bind(band_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn list_bands(&self, band_ids: &[BandId]) -> StoreResult<Vec<Band>> {
        let ids: Vec<Uuid> = band_ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, DbBand>(
            "SELECT id, name, created_at FROM bands WHERE id = ANY($1) ORDER BY name, id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(band_from_db).collect())
    }

    async fn list_all_bands(&self) -> StoreResult<Vec<Band>> {
        let rows = sqlx::query_as::<_, DbBand>(
            "SELECT id, name, created_at FROM bands ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(band_from_db).collect())
    }

    async fn membership(
        &self,
        band_id: BandId,
        user_id: UserId,
    ) -> StoreResult<Option<Membership>> {
        let row = sqlx::query_as::<_, DbMembership>(
            r#"SELECT band_id, user_id, role, status, joined_at
               FROM band_members WHERE band_id = $1 AND user_id = $2"#,
        )
        .bind(band_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(membership_from_db).transpose()
    }

    async fn band_ids_for_user(&self, user_id: UserId) -> StoreResult<Vec<BandId>> {
        let rows: Vec<Uuid> = sqlx::query_scalar(
            "SELECT band_id FROM band_members WHERE user_id = $1 ORDER BY band_id",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(BandId::from_uuid).collect())
    }

    async fn active_members(&self, band_id: BandId) -> StoreResult<Vec<UserId>> {
        let rows: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM band_members WHERE band_id = $1 AND status = $2 ORDER BY user_id",
        )
        .bind(band_id.as_uuid())
        .bind(MembershipStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserId::from_uuid).collect())
    }

    /// Insert or update the unique `(band_id, user_id)` row. An update moves
    /// role and status only; `joined_at` keeps its original value.
    async fn upsert_membership(&self, membership: Membership) -> StoreResult<Membership> {
        let row = sqlx::query_as::<_, DbMembership>(
            r#"INSERT INTO band_members (band_id, user_id, role, status, joined_at)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (band_id, user_id)
               DO UPDATE SET role = EXCLUDED.role, status = EXCLUDED.status
               RETURNING band_id, user_id, role, status, joined_at"#,
        )
        .bind(membership.band_id.as_uuid())
        .bind(membership.user_id.as_uuid())
        .bind(membership.role.as_str())
        .bind(membership.status.as_str())
        .bind(membership.joined_at)
        .fetch_one(&self.pool)
        .await;
        match row {
            Ok(row) => membership_from_db(row),
            Err(err) if is_foreign_key_violation(&err) => {
                Err(StoreError::NotFound("band".into()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Create a rehearsal and its agenda items in one transaction.
    async fn create_rehearsal(
        &self,
        rehearsal: Rehearsal,
        items: Vec<AgendaItem>,
    ) -> StoreResult<RehearsalWithItems> {
        let mut tx = self.pool.begin().await?;

        let band_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bands WHERE id = $1)")
                .bind(rehearsal.band_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        if !band_exists {
            return Err(StoreError::NotFound("band".into()));
        }

        let insert = sqlx::query(
            r#"INSERT INTO rehearsals (id, band_id, title, description, start_time, end_time, location, status, created_by, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(rehearsal.id.as_uuid())
        .bind(rehearsal.band_id.as_uuid())
        .bind(&rehearsal.title)
        .bind(&rehearsal.description)
        .bind(rehearsal.start_time)
        .bind(rehearsal.end_time)
        .bind(&rehearsal.location)
        .bind(rehearsal.status.as_str())
        .bind(rehearsal.created_by.as_uuid())
        .bind(rehearsal.created_at)
        .bind(rehearsal.updated_at)
        .execute(&mut *tx)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict("rehearsal exists".into()));
            }
            return Err(err.into());
        }

        for item in &items {
            sqlx::query(
                r#"INSERT INTO agenda_items (rehearsal_id, order_index, title, description, duration_minutes)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(rehearsal.id.as_uuid())
            .bind(item.order_index as i32)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.duration_minutes as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        metrics::counter!("encore_rehearsal_changes_total", "op" => "created").increment(1);
        self.refresh_counts().await?;
        Ok(RehearsalWithItems {
            rehearsal,
            agenda_items: items,
        })
    }

    async fn get_rehearsal(&self, rehearsal_id: RehearsalId) -> StoreResult<Rehearsal> {
        let row = sqlx::query_as::<_, DbRehearsal>(
            r#"SELECT id, band_id, title, description, start_time, end_time, location, status, created_by, created_at, updated_at
               FROM rehearsals WHERE id = $1"#,
        )
        .bind(rehearsal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => rehearsal_from_db(row),
            None => Err(StoreError::NotFound("rehearsal".into())),
        }
    }

    async fn rehearsal_detail(&self, rehearsal_id: RehearsalId) -> StoreResult<RehearsalDetail> {
        let rehearsal = self.get_rehearsal(rehearsal_id).await?;

        let band = sqlx::query_as::<_, DbBand>(
            "SELECT id, name, created_at FROM bands WHERE id = $1",
        )
        .bind(rehearsal.band_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(|row| BandSummary {
            id: BandId::from_uuid(row.id),
            name: row.name,
        })
        .ok_or_else(|| {
            StoreError::Unexpected(anyhow!("band missing for rehearsal {rehearsal_id}"))
        })?;

        let item_rows = sqlx::query_as::<_, DbAgendaItem>(
            r#"SELECT rehearsal_id, order_index, title, description, duration_minutes
               FROM agenda_items WHERE rehearsal_id = $1 ORDER BY order_index"#,
        )
        .bind(rehearsal_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let availability_rows = sqlx::query_as::<_, DbAvailability>(
            r#"SELECT user_id, rehearsal_id, status, response_time
               FROM availability WHERE rehearsal_id = $1 ORDER BY user_id"#,
        )
        .bind(rehearsal_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let attendance_rows = sqlx::query_as::<_, DbAttendance>(
            r#"SELECT user_id, rehearsal_id, status, marked_at
               FROM attendance WHERE rehearsal_id = $1 ORDER BY user_id"#,
        )
        .bind(rehearsal_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(RehearsalDetail {
            rehearsal,
            band,
            agenda_items: item_rows.into_iter().map(agenda_item_from_db).collect(),
            availability: availability_rows
                .into_iter()
                .map(availability_from_db)
                .collect::<StoreResult<Vec<_>>>()?,
            attendance: attendance_rows
                .into_iter()
                .map(attendance_from_db)
                .collect::<StoreResult<Vec<_>>>()?,
        })
    }

    async fn list_rehearsals(&self, query: &RehearsalQuery) -> StoreResult<Vec<RehearsalSummary>> {
        let band_ids: Vec<Uuid> = query.band_ids.iter().map(|id| id.as_uuid()).collect();
        // Optional filters collapse to `IS NULL` checks so one static
        // statement covers every filter combination.
        let rows = sqlx::query_as::<_, DbRehearsalListing>(
            r#"SELECT r.id, r.band_id, r.title, r.description, r.start_time, r.end_time,
                      r.location, r.status, r.created_by, r.created_at, r.updated_at,
                      b.name AS band_name,
                      a.status AS my_availability
               FROM rehearsals r
               JOIN bands b ON b.id = r.band_id
               LEFT JOIN availability a ON a.rehearsal_id = r.id AND a.user_id = $2
               WHERE r.band_id = ANY($1)
                 AND ($3::text IS NULL OR r.status = $3)
                 AND ($4::timestamptz IS NULL OR r.start_time >= $4)
                 AND ($5::timestamptz IS NULL OR r.start_time <= $5)
               ORDER BY r.start_time ASC, r.id ASC"#,
        )
        .bind(&band_ids)
        .bind(query.viewer.as_uuid())
        .bind(query.status.map(|status| status.as_str()))
        .bind(query.from)
        .bind(query.to)
        .fetch_all(&self.pool)
        .await?;

        let rehearsal_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let item_rows = sqlx::query_as::<_, DbAgendaItem>(
            r#"SELECT rehearsal_id, order_index, title, description, duration_minutes
               FROM agenda_items WHERE rehearsal_id = ANY($1)
               ORDER BY rehearsal_id, order_index"#,
        )
        .bind(&rehearsal_ids)
        .fetch_all(&self.pool)
        .await?;
        let mut items_by_rehearsal: HashMap<Uuid, Vec<AgendaItem>> = HashMap::new();
        for row in item_rows {
            items_by_rehearsal
                .entry(row.rehearsal_id)
                .or_default()
                .push(agenda_item_from_db(row));
        }

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let agenda_items = items_by_rehearsal.remove(&row.id).unwrap_or_default();
            let my_availability = row
                .my_availability
                .as_deref()
                .map(parse_availability_status)
                .transpose()?;
            summaries.push(RehearsalSummary {
                rehearsal: rehearsal_from_db(DbRehearsal {
                    id: row.id,
                    band_id: row.band_id,
                    title: row.title,
                    description: row.description,
                    start_time: row.start_time,
                    end_time: row.end_time,
                    location: row.location,
                    status: row.status,
                    created_by: row.created_by,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })?,
                band_name: row.band_name,
                agenda_items,
                my_availability,
            });
        }
        Ok(summaries)
    }

    /// Apply the patch as one conditional `UPDATE`. Untouched columns keep
    /// their value via `COALESCE`; the `WHERE` clause re-checks the resulting
    /// time range, so a racing update that would invert the range matches no
    /// row and is reported as a conflict.
    async fn update_rehearsal(
        &self,
        rehearsal_id: RehearsalId,
        patch: &RehearsalPatch,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Rehearsal> {
        let row = sqlx::query_as::<_, DbRehearsal>(
            r#"UPDATE rehearsals SET
                   title = COALESCE($2::text, title),
                   description = COALESCE($3::text, description),
                   start_time = COALESCE($4::timestamptz, start_time),
                   end_time = COALESCE($5::timestamptz, end_time),
                   location = COALESCE($6::text, location),
                   status = COALESCE($7::text, status),
                   updated_at = $8
               WHERE id = $1
                 AND COALESCE($5::timestamptz, end_time) > COALESCE($4::timestamptz, start_time)
               RETURNING id, band_id, title, description, start_time, end_time, location, status, created_by, created_at, updated_at"#,
        )
        .bind(rehearsal_id.as_uuid())
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.start_time)
        .bind(patch.end_time)
        .bind(&patch.location)
        .bind(patch.status.map(|status| status.as_str()))
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                metrics::counter!("encore_rehearsal_changes_total", "op" => "updated")
                    .increment(1);
                rehearsal_from_db(row)
            }
            None => {
                // No row matched: either the rehearsal does not exist or the
                // range guard rejected the combined result.
                if self.rehearsal_exists(rehearsal_id).await? {
                    Err(StoreError::Conflict(
                        "rehearsal time range would invert".into(),
                    ))
                } else {
                    Err(StoreError::NotFound("rehearsal".into()))
                }
            }
        }
    }

    async fn upsert_availability(&self, entry: Availability) -> StoreResult<Availability> {
        let row = sqlx::query_as::<_, DbAvailability>(
            r#"INSERT INTO availability (user_id, rehearsal_id, status, response_time)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (user_id, rehearsal_id)
               DO UPDATE SET status = EXCLUDED.status, response_time = EXCLUDED.response_time
               RETURNING user_id, rehearsal_id, status, response_time"#,
        )
        .bind(entry.user_id.as_uuid())
        .bind(entry.rehearsal_id.as_uuid())
        .bind(entry.status.as_str())
        .bind(entry.response_time)
        .fetch_one(&self.pool)
        .await;
        match row {
            Ok(row) => {
                metrics::counter!("encore_availability_upserts_total").increment(1);
                availability_from_db(row)
            }
            Err(err) if is_foreign_key_violation(&err) => {
                Err(StoreError::NotFound("rehearsal".into()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn upsert_attendance(&self, entry: Attendance) -> StoreResult<Attendance> {
        let row = sqlx::query_as::<_, DbAttendance>(
            r#"INSERT INTO attendance (user_id, rehearsal_id, status, marked_at)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (user_id, rehearsal_id)
               DO UPDATE SET status = EXCLUDED.status, marked_at = EXCLUDED.marked_at
               RETURNING user_id, rehearsal_id, status, marked_at"#,
        )
        .bind(entry.user_id.as_uuid())
        .bind(entry.rehearsal_id.as_uuid())
        .bind(entry.status.as_str())
        .bind(entry.marked_at)
        .fetch_one(&self.pool)
        .await;
        match row {
            Ok(row) => {
                metrics::counter!("encore_attendance_upserts_total").increment(1);
                attendance_from_db(row)
            }
            Err(err) if is_foreign_key_violation(&err) => {
                Err(StoreError::NotFound("rehearsal".into()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Bulk insert one notification row per recipient. `UNNEST` keeps this a
    /// single statement regardless of fan-out size.
    async fn insert_notifications(&self, rows: Vec<Notification>) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let count = rows.len();
        let mut ids = Vec::with_capacity(count);
        let mut user_ids = Vec::with_capacity(count);
        let mut rehearsal_ids = Vec::with_capacity(count);
        let mut kinds = Vec::with_capacity(count);
        let mut messages = Vec::with_capacity(count);
        let mut created_ats = Vec::with_capacity(count);
        for row in rows {
            ids.push(row.id.as_uuid());
            user_ids.push(row.user_id.as_uuid());
            rehearsal_ids.push(row.rehearsal_id.as_uuid());
            kinds.push(row.kind.as_str());
            messages.push(row.message);
            created_ats.push(row.created_at);
        }
        sqlx::query(
            r#"INSERT INTO notifications (id, user_id, rehearsal_id, kind, message, created_at)
               SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::text[], $5::text[], $6::timestamptz[])"#,
        )
        .bind(&ids)
        .bind(&user_ids)
        .bind(&rehearsal_ids)
        .bind(&kinds)
        .bind(&messages)
        .bind(&created_ats)
        .execute(&self.pool)
        .await?;
        metrics::counter!("encore_notifications_total").increment(count as u64);
        Ok(())
    }

    async fn notifications_for_user(&self, user_id: UserId) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, DbNotification>(
            r#"SELECT id, user_id, rehearsal_id, kind, message, created_at
               FROM notifications WHERE user_id = $1 ORDER BY created_at, id"#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(notification_from_db).collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

impl PostgresStore {
    async fn rehearsal_exists(&self, rehearsal_id: RehearsalId) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rehearsals WHERE id = $1)")
                .bind(rehearsal_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23503").unwrap_or(false);
    }
    false
}

fn band_from_db(row: DbBand) -> Band {
    Band {
        id: BandId::from_uuid(row.id),
        name: row.name,
        created_at: row.created_at,
    }
}

fn membership_from_db(row: DbMembership) -> StoreResult<Membership> {
    Ok(Membership {
        band_id: BandId::from_uuid(row.band_id),
        user_id: UserId::from_uuid(row.user_id),
        role: parse_band_role(&row.role)?,
        status: parse_membership_status(&row.status)?,
        joined_at: row.joined_at,
    })
}

fn rehearsal_from_db(row: DbRehearsal) -> StoreResult<Rehearsal> {
    Ok(Rehearsal {
        id: RehearsalId::from_uuid(row.id),
        band_id: BandId::from_uuid(row.band_id),
        title: row.title,
        description: row.description,
        start_time: row.start_time,
        end_time: row.end_time,
        location: row.location,
        status: parse_rehearsal_status(&row.status)?,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn agenda_item_from_db(row: DbAgendaItem) -> AgendaItem {
    AgendaItem {
        title: row.title,
        description: row.description,
        duration_minutes: row.duration_minutes as u32,
        order_index: row.order_index as u32,
    }
}

fn availability_from_db(row: DbAvailability) -> StoreResult<Availability> {
    Ok(Availability {
        user_id: UserId::from_uuid(row.user_id),
        rehearsal_id: RehearsalId::from_uuid(row.rehearsal_id),
        status: parse_availability_status(&row.status)?,
        response_time: row.response_time,
    })
}

fn attendance_from_db(row: DbAttendance) -> StoreResult<Attendance> {
    Ok(Attendance {
        user_id: UserId::from_uuid(row.user_id),
        rehearsal_id: RehearsalId::from_uuid(row.rehearsal_id),
        status: parse_attendance_status(&row.status)?,
        marked_at: row.marked_at,
    })
}

fn notification_from_db(row: DbNotification) -> StoreResult<Notification> {
    Ok(Notification {
        id: NotificationId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        rehearsal_id: RehearsalId::from_uuid(row.rehearsal_id),
        kind: parse_notification_kind(&row.kind)?,
        message: row.message,
        created_at: row.created_at,
    })
}

fn parse_band_role(value: &str) -> StoreResult<BandRole> {
    BandRole::parse(value).ok_or_else(|| StoreError::Unexpected(anyhow!("invalid role {value}")))
}

fn parse_membership_status(value: &str) -> StoreResult<MembershipStatus> {
    MembershipStatus::parse(value)
        .ok_or_else(|| StoreError::Unexpected(anyhow!("invalid membership status {value}")))
}

fn parse_rehearsal_status(value: &str) -> StoreResult<RehearsalStatus> {
    RehearsalStatus::parse(value)
        .ok_or_else(|| StoreError::Unexpected(anyhow!("invalid rehearsal status {value}")))
}

fn parse_availability_status(value: &str) -> StoreResult<AvailabilityStatus> {
    AvailabilityStatus::parse(value)
        .ok_or_else(|| StoreError::Unexpected(anyhow!("invalid availability status {value}")))
}

fn parse_attendance_status(value: &str) -> StoreResult<AttendanceStatus> {
    AttendanceStatus::parse(value)
        .ok_or_else(|| StoreError::Unexpected(anyhow!("invalid attendance status {value}")))
}

fn parse_notification_kind(value: &str) -> StoreResult<NotificationKind> {
    NotificationKind::parse(value)
        .ok_or_else(|| StoreError::Unexpected(anyhow!("invalid notification kind {value}")))
}
