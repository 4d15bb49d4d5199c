//! In-memory implementation of the scheduler store.
//!
//! # Purpose
//! This store implements the `SchedulerStore` trait entirely in memory using
//! `HashMap`s guarded by `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: mutations take a write lock on the map
//!   they touch, so upserts and conditional updates are atomic within one
//!   process.
//! - Parent-existence checks (band for a rehearsal, rehearsal for an
//!   availability row) mirror the foreign keys the Postgres backend enforces.
//!
//! # Metrics
//! This store updates a small set of gauges/counters to keep observability
//! behavior consistent with the durable backend.
use super::{SchedulerStore, StoreError, StoreResult};
use crate::model::{
    AgendaItem, Attendance, Availability, Band, BandSummary, Membership, MembershipStatus,
    Notification, Rehearsal, RehearsalDetail, RehearsalPatch, RehearsalQuery, RehearsalSummary,
    RehearsalWithItems,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_common::ids::{BandId, RehearsalId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory scheduler store.
///
/// Authoritative state lives in `HashMap`s keyed the same way the Postgres
/// schema keys its tables, wrapped in `Arc<RwLock<...>>` so the store can be
/// shared across async request handlers with concurrent reads and serialized
/// writes.
#[derive(Default)]
pub struct InMemoryStore {
    /// Bands keyed by id.
    bands: Arc<RwLock<HashMap<BandId, Band>>>,
    /// Membership rows keyed by the unique `(band_id, user_id)` pair.
    memberships: Arc<RwLock<HashMap<(BandId, UserId), Membership>>>,
    /// Rehearsals keyed by id.
    rehearsals: Arc<RwLock<HashMap<RehearsalId, Rehearsal>>>,
    /// Agenda items per rehearsal, kept in `order_index` order.
    agenda_items: Arc<RwLock<HashMap<RehearsalId, Vec<AgendaItem>>>>,
    /// Availability rows keyed by the unique `(user_id, rehearsal_id)` pair.
    availability: Arc<RwLock<HashMap<(UserId, RehearsalId), Availability>>>,
    /// Attendance rows keyed by the unique `(user_id, rehearsal_id)` pair.
    attendance: Arc<RwLock<HashMap<(UserId, RehearsalId), Attendance>>>,
    /// Append-only notification log.
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchedulerStore for InMemoryStore {
    async fn create_band(&self, band: Band, founder: Membership) -> StoreResult<Band> {
        // Band plus founding manager membership land under consecutive write
        // locks; nothing reads the half-created band in between because its id
        // is not yet known to any caller.
        let mut bands = self.bands.write().await;
        if bands.contains_key(&band.id) {
            return Err(StoreError::Conflict("band exists".into()));
        }
        bands.insert(band.id, band.clone());
        metrics::gauge!("encore_bands_total").set(bands.len() as f64);
        drop(bands);
        self.memberships
            .write()
            .await
            .insert((founder.band_id, founder.user_id), founder);
        Ok(band)
    }

    async fn get_band(&self, band_id: BandId) -> StoreResult<Band> {
        self.bands
            .read()
            .await
            .get(&band_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("band".into()))
    }

    async fn band_exists(&self, band_id: BandId) -> StoreResult<bool> {
        Ok(self.bands.read().await.contains_key(&band_id))
    }

    async fn list_bands(&self, band_ids: &[BandId]) -> StoreResult<Vec<Band>> {
        let bands = self.bands.read().await;
        let mut items: Vec<Band> = band_ids
            .iter()
            .filter_map(|id| bands.get(id).cloned())
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn list_all_bands(&self) -> StoreResult<Vec<Band>> {
        let mut items: Vec<Band> = self.bands.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn membership(
        &self,
        band_id: BandId,
        user_id: UserId,
    ) -> StoreResult<Option<Membership>> {
        Ok(self
            .memberships
            .read()
            .await
            .get(&(band_id, user_id))
            .cloned())
    }

    async fn band_ids_for_user(&self, user_id: UserId) -> StoreResult<Vec<BandId>> {
        // Any membership row counts here, whatever its role or status.
        let mut ids: Vec<BandId> = self
            .memberships
            .read()
            .await
            .keys()
            .filter(|(_, member)| *member == user_id)
            .map(|(band, _)| *band)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn active_members(&self, band_id: BandId) -> StoreResult<Vec<UserId>> {
        let mut members: Vec<UserId> = self
            .memberships
            .read()
            .await
            .values()
            .filter(|m| m.band_id == band_id && m.status == MembershipStatus::Active)
            .map(|m| m.user_id)
            .collect();
        members.sort();
        Ok(members)
    }

    async fn upsert_membership(&self, membership: Membership) -> StoreResult<Membership> {
        if !self.band_exists(membership.band_id).await? {
            return Err(StoreError::NotFound("band".into()));
        }
        let mut memberships = self.memberships.write().await;
        let key = (membership.band_id, membership.user_id);
        let stored = match memberships.get_mut(&key) {
            // Updates keep the original joined_at; only role and status move.
            Some(existing) => {
                existing.role = membership.role;
                existing.status = membership.status;
                existing.clone()
            }
            None => {
                memberships.insert(key, membership.clone());
                membership
            }
        };
        Ok(stored)
    }

    async fn create_rehearsal(
        &self,
        rehearsal: Rehearsal,
        items: Vec<AgendaItem>,
    ) -> StoreResult<RehearsalWithItems> {
        // Parent check mirrors the FK the Postgres backend enforces.
        if !self.band_exists(rehearsal.band_id).await? {
            return Err(StoreError::NotFound("band".into()));
        }
        let mut rehearsals = self.rehearsals.write().await;
        if rehearsals.contains_key(&rehearsal.id) {
            return Err(StoreError::Conflict("rehearsal exists".into()));
        }
        rehearsals.insert(rehearsal.id, rehearsal.clone());
        metrics::gauge!("encore_rehearsals_total").set(rehearsals.len() as f64);
        drop(rehearsals);
        self.agenda_items
            .write()
            .await
            .insert(rehearsal.id, items.clone());
        metrics::counter!("encore_rehearsal_changes_total", "op" => "created").increment(1);
        Ok(RehearsalWithItems {
            rehearsal,
            agenda_items: items,
        })
    }

    async fn get_rehearsal(&self, rehearsal_id: RehearsalId) -> StoreResult<Rehearsal> {
        self.rehearsals
            .read()
            .await
            .get(&rehearsal_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("rehearsal".into()))
    }

    async fn rehearsal_detail(&self, rehearsal_id: RehearsalId) -> StoreResult<RehearsalDetail> {
        let rehearsal = self.get_rehearsal(rehearsal_id).await?;
        let band = self
            .bands
            .read()
            .await
            .get(&rehearsal.band_id)
            .map(BandSummary::from)
            .ok_or_else(|| {
                StoreError::Unexpected(anyhow!("band missing for rehearsal {rehearsal_id}"))
            })?;
        let agenda_items = self
            .agenda_items
            .read()
            .await
            .get(&rehearsal_id)
            .cloned()
            .unwrap_or_default();
        let mut availability: Vec<Availability> = self
            .availability
            .read()
            .await
            .values()
            .filter(|a| a.rehearsal_id == rehearsal_id)
            .cloned()
            .collect();
        availability.sort_by_key(|a| a.user_id);
        let mut attendance: Vec<Attendance> = self
            .attendance
            .read()
            .await
            .values()
            .filter(|a| a.rehearsal_id == rehearsal_id)
            .cloned()
            .collect();
        attendance.sort_by_key(|a| a.user_id);
        Ok(RehearsalDetail {
            rehearsal,
            band,
            agenda_items,
            availability,
            attendance,
        })
    }

    async fn list_rehearsals(&self, query: &RehearsalQuery) -> StoreResult<Vec<RehearsalSummary>> {
        let rehearsals = self.rehearsals.read().await;
        let mut matched: Vec<Rehearsal> = rehearsals
            .values()
            .filter(|r| query.band_ids.contains(&r.band_id))
            .filter(|r| query.status.map_or(true, |status| r.status == status))
            .filter(|r| query.from.map_or(true, |from| r.start_time >= from))
            .filter(|r| query.to.map_or(true, |to| r.start_time <= to))
            .cloned()
            .collect();
        drop(rehearsals);
        matched.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));

        let bands = self.bands.read().await;
        let agenda_items = self.agenda_items.read().await;
        let availability = self.availability.read().await;
        let mut summaries = Vec::with_capacity(matched.len());
        for rehearsal in matched {
            let band_name = bands
                .get(&rehearsal.band_id)
                .map(|b| b.name.clone())
                .ok_or_else(|| {
                    StoreError::Unexpected(anyhow!("band missing for rehearsal {}", rehearsal.id))
                })?;
            let items = agenda_items.get(&rehearsal.id).cloned().unwrap_or_default();
            let my_availability = availability
                .get(&(query.viewer, rehearsal.id))
                .map(|a| a.status);
            summaries.push(RehearsalSummary {
                rehearsal,
                band_name,
                agenda_items: items,
                my_availability,
            });
        }
        Ok(summaries)
    }

    async fn update_rehearsal(
        &self,
        rehearsal_id: RehearsalId,
        patch: &RehearsalPatch,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Rehearsal> {
        let mut rehearsals = self.rehearsals.write().await;
        let rehearsal = rehearsals
            .get_mut(&rehearsal_id)
            .ok_or_else(|| StoreError::NotFound("rehearsal".into()))?;
        // Resulting-range guard: the pair that would be stored, with the
        // untouched side taken from the current row, must stay valid. Under
        // concurrency this catches combinations the caller could not see.
        let start = patch.start_time.unwrap_or(rehearsal.start_time);
        let end = patch.end_time.unwrap_or(rehearsal.end_time);
        if end <= start {
            return Err(StoreError::Conflict(
                "rehearsal time range would invert".into(),
            ));
        }
        if let Some(title) = &patch.title {
            rehearsal.title = title.clone();
        }
        if let Some(description) = &patch.description {
            rehearsal.description = Some(description.clone());
        }
        if let Some(start_time) = patch.start_time {
            rehearsal.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            rehearsal.end_time = end_time;
        }
        if let Some(location) = &patch.location {
            rehearsal.location = Some(location.clone());
        }
        if let Some(status) = patch.status {
            rehearsal.status = status;
        }
        rehearsal.updated_at = updated_at;
        let updated = rehearsal.clone();
        metrics::counter!("encore_rehearsal_changes_total", "op" => "updated").increment(1);
        Ok(updated)
    }

    async fn upsert_availability(&self, entry: Availability) -> StoreResult<Availability> {
        if !self.rehearsals.read().await.contains_key(&entry.rehearsal_id) {
            return Err(StoreError::NotFound("rehearsal".into()));
        }
        // Plain insert under the write lock is the whole upsert: the map key
        // is the unique pair, so concurrent calls converge to one row with
        // the last writer's status and response_time.
        self.availability
            .write()
            .await
            .insert((entry.user_id, entry.rehearsal_id), entry.clone());
        metrics::counter!("encore_availability_upserts_total").increment(1);
        Ok(entry)
    }

    async fn upsert_attendance(&self, entry: Attendance) -> StoreResult<Attendance> {
        if !self.rehearsals.read().await.contains_key(&entry.rehearsal_id) {
            return Err(StoreError::NotFound("rehearsal".into()));
        }
        self.attendance
            .write()
            .await
            .insert((entry.user_id, entry.rehearsal_id), entry.clone());
        metrics::counter!("encore_attendance_upserts_total").increment(1);
        Ok(entry)
    }

    async fn insert_notifications(&self, rows: Vec<Notification>) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let count = rows.len();
        self.notifications.write().await.extend(rows);
        metrics::counter!("encore_notifications_total").increment(count as u64);
        Ok(())
    }

    async fn notifications_for_user(&self, user_id: UserId) -> StoreResult<Vec<Notification>> {
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        // In-memory backend is always "healthy" if the process is running.
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AttendanceStatus, AvailabilityStatus, BandRole, NotificationKind, RehearsalStatus,
    };
    use chrono::Duration;
    use encore_common::ids::NotificationId;

    fn band(name: &str) -> Band {
        Band {
            id: BandId::new(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    fn membership(
        band_id: BandId,
        user_id: UserId,
        role: BandRole,
        status: MembershipStatus,
    ) -> Membership {
        Membership {
            band_id,
            user_id,
            role,
            status,
            joined_at: Utc::now(),
        }
    }

    fn rehearsal(band_id: BandId, title: &str, start_in_hours: i64) -> Rehearsal {
        let start = Utc::now() + Duration::hours(start_in_hours);
        Rehearsal {
            id: RehearsalId::new(),
            band_id,
            title: title.to_string(),
            description: None,
            start_time: start,
            end_time: start + Duration::hours(2),
            location: None,
            status: RehearsalStatus::Scheduled,
            created_by: UserId::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn band_membership_round_trip() {
        let store = InMemoryStore::new();
        let founder = UserId::new();
        let created = band("The Distortions");
        store
            .create_band(
                created.clone(),
                membership(
                    created.id,
                    founder,
                    BandRole::BandManager,
                    MembershipStatus::Active,
                ),
            )
            .await
            .expect("create band");

        let fetched = store.get_band(created.id).await.expect("get band");
        assert_eq!(fetched.name, "The Distortions");
        let row = store
            .membership(created.id, founder)
            .await
            .expect("membership")
            .expect("founder row");
        assert_eq!(row.role, BandRole::BandManager);
        assert_eq!(store.band_ids_for_user(founder).await.expect("bands"), vec![created.id]);

        // Upsert flips the founder inactive; active_members must drop them.
        store
            .upsert_membership(membership(
                created.id,
                founder,
                BandRole::BandManager,
                MembershipStatus::Inactive,
            ))
            .await
            .expect("upsert");
        assert!(store
            .active_members(created.id)
            .await
            .expect("active")
            .is_empty());
        // Inactive rows still count as membership.
        assert_eq!(store.band_ids_for_user(founder).await.expect("bands").len(), 1);
    }

    #[tokio::test]
    async fn rehearsal_requires_existing_band() {
        let store = InMemoryStore::new();
        let err = store
            .create_rehearsal(rehearsal(BandId::new(), "Orphan", 1), Vec::new())
            .await
            .expect_err("missing band");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_merges_fields_and_guards_range() {
        let store = InMemoryStore::new();
        let b = band("Quartet");
        let founder = UserId::new();
        store
            .create_band(
                b.clone(),
                membership(b.id, founder, BandRole::BandManager, MembershipStatus::Active),
            )
            .await
            .expect("band");
        let created = rehearsal(b.id, "Sound check", 4);
        store
            .create_rehearsal(created.clone(), Vec::new())
            .await
            .expect("rehearsal");

        let updated = store
            .update_rehearsal(
                created.id,
                &RehearsalPatch {
                    title: None,
                    description: None,
                    start_time: None,
                    end_time: None,
                    location: Some("Room 2".to_string()),
                    status: None,
                },
                Utc::now(),
            )
            .await
            .expect("patch location");
        assert_eq!(updated.title, "Sound check");
        assert_eq!(updated.location.as_deref(), Some("Room 2"));
        assert_eq!(updated.start_time, created.start_time);

        let err = store
            .update_rehearsal(
                created.id,
                &RehearsalPatch {
                    title: None,
                    description: None,
                    start_time: None,
                    end_time: Some(created.start_time - Duration::hours(1)),
                    location: None,
                    status: None,
                },
                Utc::now(),
            )
            .await
            .expect_err("inverted range");
        assert!(matches!(err, StoreError::Conflict(_)));

        // The rejected write must leave the row untouched.
        let current = store.get_rehearsal(created.id).await.expect("get");
        assert_eq!(current.end_time, created.end_time);
    }

    #[tokio::test]
    async fn availability_upsert_converges_to_one_row() {
        let store = InMemoryStore::new();
        let b = band("Trio");
        let founder = UserId::new();
        store
            .create_band(
                b.clone(),
                membership(b.id, founder, BandRole::BandManager, MembershipStatus::Active),
            )
            .await
            .expect("band");
        let r = rehearsal(b.id, "Full run", 2);
        store
            .create_rehearsal(r.clone(), Vec::new())
            .await
            .expect("rehearsal");

        let first = Availability {
            user_id: founder,
            rehearsal_id: r.id,
            status: AvailabilityStatus::Maybe,
            response_time: Utc::now(),
        };
        store.upsert_availability(first.clone()).await.expect("first");
        let second = Availability {
            status: AvailabilityStatus::Available,
            response_time: first.response_time + Duration::seconds(5),
            ..first.clone()
        };
        store.upsert_availability(second.clone()).await.expect("second");

        let detail = store.rehearsal_detail(r.id).await.expect("detail");
        assert_eq!(detail.availability.len(), 1);
        assert_eq!(detail.availability[0].status, AvailabilityStatus::Available);
        assert_eq!(detail.availability[0].response_time, second.response_time);
    }

    #[tokio::test]
    async fn attendance_upsert_requires_rehearsal() {
        let store = InMemoryStore::new();
        let err = store
            .upsert_attendance(Attendance {
                user_id: UserId::new(),
                rehearsal_id: RehearsalId::new(),
                status: AttendanceStatus::Present,
                marked_at: Utc::now(),
            })
            .await
            .expect_err("missing rehearsal");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_and_orders_by_start_time() {
        let store = InMemoryStore::new();
        let b1 = band("Alpha");
        let b2 = band("Beta");
        let viewer = UserId::new();
        for b in [&b1, &b2] {
            store
                .create_band(
                    (*b).clone(),
                    membership(b.id, viewer, BandRole::Member, MembershipStatus::Active),
                )
                .await
                .expect("band");
        }
        let late = rehearsal(b1.id, "Late", 10);
        let early = rehearsal(b1.id, "Early", 1);
        let other_band = rehearsal(b2.id, "Elsewhere", 5);
        for r in [&late, &early, &other_band] {
            store
                .create_rehearsal((*r).clone(), Vec::new())
                .await
                .expect("rehearsal");
        }
        store
            .upsert_availability(Availability {
                user_id: viewer,
                rehearsal_id: early.id,
                status: AvailabilityStatus::Unavailable,
                response_time: Utc::now(),
            })
            .await
            .expect("availability");

        let both = store
            .list_rehearsals(&RehearsalQuery {
                band_ids: vec![b1.id],
                status: None,
                from: None,
                to: None,
                viewer,
            })
            .await
            .expect("list");
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].rehearsal.title, "Early");
        assert_eq!(both[0].band_name, "Alpha");
        assert_eq!(both[0].my_availability, Some(AvailabilityStatus::Unavailable));
        assert_eq!(both[1].rehearsal.title, "Late");
        assert_eq!(both[1].my_availability, None);

        let windowed = store
            .list_rehearsals(&RehearsalQuery {
                band_ids: vec![b1.id, b2.id],
                status: Some(RehearsalStatus::Scheduled),
                from: Some(Utc::now() + Duration::hours(3)),
                to: Some(Utc::now() + Duration::hours(7)),
                viewer,
            })
            .await
            .expect("windowed");
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].rehearsal.title, "Elsewhere");
    }

    #[tokio::test]
    async fn notifications_append_and_filter_by_recipient() {
        let store = InMemoryStore::new();
        let (u1, u2) = (UserId::new(), UserId::new());
        let rehearsal_id = RehearsalId::new();
        store
            .insert_notifications(vec![
                Notification {
                    id: NotificationId::new(),
                    user_id: u1,
                    rehearsal_id,
                    kind: NotificationKind::Update,
                    message: "New rehearsal scheduled: Full run".to_string(),
                    created_at: Utc::now(),
                },
                Notification {
                    id: NotificationId::new(),
                    user_id: u2,
                    rehearsal_id,
                    kind: NotificationKind::Update,
                    message: "New rehearsal scheduled: Full run".to_string(),
                    created_at: Utc::now(),
                },
            ])
            .await
            .expect("insert");

        let for_u1 = store.notifications_for_user(u1).await.expect("read");
        assert_eq!(for_u1.len(), 1);
        assert_eq!(for_u1[0].kind, NotificationKind::Update);
        assert_eq!(store.notifications_for_user(u2).await.expect("read").len(), 1);
    }
}
