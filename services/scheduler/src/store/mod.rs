use crate::model::{
    AgendaItem, Attendance, Availability, Band, Membership, Notification, Rehearsal,
    RehearsalDetail, RehearsalPatch, RehearsalQuery, RehearsalSummary, RehearsalWithItems,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_common::ids::{BandId, RehearsalId, UserId};
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("transient storage failure: {0}")]
    Transient(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".to_string()),
            sqlx::Error::PoolTimedOut => {
                StoreError::Transient("postgres pool acquire timed out".to_string())
            }
            sqlx::Error::Io(io) => StoreError::Transient(format!("postgres io: {io}")),
            other => StoreError::Unexpected(other.into()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for the scheduler.
///
/// Mutations that must be atomic (rehearsal + agenda items, band + founding
/// membership) are single trait calls so each backend can wrap them in its
/// own transaction primitive. Upserts are insert-or-update in one call; a
/// duplicate-key error never escapes them.
#[async_trait]
pub trait SchedulerStore: Send + Sync {
    async fn create_band(&self, band: Band, founder: Membership) -> StoreResult<Band>;
    async fn get_band(&self, band_id: BandId) -> StoreResult<Band>;
    async fn band_exists(&self, band_id: BandId) -> StoreResult<bool>;
    async fn list_bands(&self, band_ids: &[BandId]) -> StoreResult<Vec<Band>>;
    async fn list_all_bands(&self) -> StoreResult<Vec<Band>>;

    async fn membership(&self, band_id: BandId, user_id: UserId)
        -> StoreResult<Option<Membership>>;
    async fn band_ids_for_user(&self, user_id: UserId) -> StoreResult<Vec<BandId>>;
    async fn active_members(&self, band_id: BandId) -> StoreResult<Vec<UserId>>;
    async fn upsert_membership(&self, membership: Membership) -> StoreResult<Membership>;

    async fn create_rehearsal(
        &self,
        rehearsal: Rehearsal,
        items: Vec<AgendaItem>,
    ) -> StoreResult<RehearsalWithItems>;
    async fn get_rehearsal(&self, rehearsal_id: RehearsalId) -> StoreResult<Rehearsal>;
    async fn rehearsal_detail(&self, rehearsal_id: RehearsalId) -> StoreResult<RehearsalDetail>;
    async fn list_rehearsals(&self, query: &RehearsalQuery) -> StoreResult<Vec<RehearsalSummary>>;
    /// Applies the patch as one conditional write. The resulting
    /// `(start_time, end_time)` pair is re-checked inside the write; a racing
    /// update that would combine into an inverted range fails with `Conflict`.
    async fn update_rehearsal(
        &self,
        rehearsal_id: RehearsalId,
        patch: &RehearsalPatch,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Rehearsal>;

    async fn upsert_availability(&self, entry: Availability) -> StoreResult<Availability>;
    async fn upsert_attendance(&self, entry: Attendance) -> StoreResult<Attendance>;

    async fn insert_notifications(&self, rows: Vec<Notification>) -> StoreResult<()>;
    async fn notifications_for_user(&self, user_id: UserId) -> StoreResult<Vec<Notification>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
