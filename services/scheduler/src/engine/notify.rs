//! Notification fan-out.
//!
//! # Purpose
//! Resolves the ACTIVE member set of a band at call time, writes one
//! notification row per recipient in a single bulk insert, then publishes a
//! best-effort live event. Runs after the primary mutation committed; the
//! engine reports a failure here as a warning, never as an operation error.
use crate::engine::live::{LiveUpdates, RehearsalEvent};
use crate::model::{Notification, NotificationKind};
use crate::store::{SchedulerStore, StoreError};
use chrono::Utc;
use encore_common::ids::{BandId, NotificationId, RehearsalId};
use std::sync::Arc;

/// What to tell the band about.
#[derive(Debug, Clone)]
pub(crate) struct FanoutEvent {
    pub rehearsal_id: RehearsalId,
    pub kind: NotificationKind,
    pub message: String,
}

pub struct NotificationFanout {
    store: Arc<dyn SchedulerStore>,
    live: Arc<LiveUpdates>,
}

impl NotificationFanout {
    pub fn new(store: Arc<dyn SchedulerStore>, live: Arc<LiveUpdates>) -> Self {
        Self { store, live }
    }

    /// Writes one notification per ACTIVE member, then broadcasts the event
    /// to live subscribers of the band. Returns the number of durable rows.
    ///
    /// # Errors
    /// - Storage failures from the member lookup or the bulk insert. The live
    ///   broadcast cannot fail; drops are counted, not reported.
    pub(crate) async fn notify(
        &self,
        band_id: BandId,
        event: FanoutEvent,
    ) -> Result<usize, StoreError> {
        let recipients = self.store.active_members(band_id).await?;
        let created_at = Utc::now();
        let rows: Vec<Notification> = recipients
            .iter()
            .map(|user_id| Notification {
                id: NotificationId::new(),
                user_id: *user_id,
                rehearsal_id: event.rehearsal_id,
                kind: event.kind,
                message: event.message.clone(),
                created_at,
            })
            .collect();
        let count = rows.len();
        if count > 0 {
            self.store.insert_notifications(rows).await?;
        }
        self.live.publish(RehearsalEvent {
            band_id,
            rehearsal_id: event.rehearsal_id,
            kind: event.kind,
            message: event.message,
        });
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Band, BandRole, Membership, MembershipStatus};
    use crate::store::memory::InMemoryStore;
    use encore_common::ids::UserId;

    async fn band_with_members(
        store: &InMemoryStore,
        statuses: &[MembershipStatus],
    ) -> (BandId, Vec<UserId>) {
        let band = Band {
            id: BandId::new(),
            name: "Brass Section".to_string(),
            created_at: Utc::now(),
        };
        let mut members = Vec::new();
        let founder = UserId::new();
        members.push(founder);
        store
            .create_band(
                band.clone(),
                Membership {
                    band_id: band.id,
                    user_id: founder,
                    role: BandRole::BandManager,
                    status: statuses[0],
                    joined_at: Utc::now(),
                },
            )
            .await
            .expect("create band");
        for status in &statuses[1..] {
            let user_id = UserId::new();
            members.push(user_id);
            store
                .upsert_membership(Membership {
                    band_id: band.id,
                    user_id,
                    role: BandRole::Member,
                    status: *status,
                    joined_at: Utc::now(),
                })
                .await
                .expect("membership");
        }
        (band.id, members)
    }

    fn update_event(message: &str) -> FanoutEvent {
        FanoutEvent {
            rehearsal_id: RehearsalId::new(),
            kind: NotificationKind::Update,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn writes_one_row_per_active_member() {
        let store = Arc::new(InMemoryStore::new());
        let (band_id, members) = band_with_members(
            &store,
            &[
                MembershipStatus::Active,
                MembershipStatus::Active,
                MembershipStatus::Inactive,
            ],
        )
        .await;
        let fanout = NotificationFanout::new(store.clone(), Arc::new(LiveUpdates::new()));

        let count = fanout
            .notify(band_id, update_event("New rehearsal scheduled: Sectional"))
            .await
            .expect("notify");
        assert_eq!(count, 2);

        let inactive = store
            .notifications_for_user(members[2])
            .await
            .expect("rows");
        assert!(inactive.is_empty());
        let active = store.notifications_for_user(members[1]).await.expect("rows");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "New rehearsal scheduled: Sectional");
        assert_eq!(active[0].kind, NotificationKind::Update);
    }

    #[tokio::test]
    async fn broadcasts_to_live_subscribers_after_insert() {
        let store = Arc::new(InMemoryStore::new());
        let (band_id, _) = band_with_members(&store, &[MembershipStatus::Active]).await;
        let live = Arc::new(LiveUpdates::new());
        let mut sub = live.subscribe(band_id);
        let fanout = NotificationFanout::new(store, live);

        fanout
            .notify(band_id, update_event("New rehearsal scheduled: Sectional"))
            .await
            .expect("notify");

        let event = sub.recv().await.expect("live event");
        assert_eq!(event.band_id, band_id);
        assert_eq!(event.message, "New rehearsal scheduled: Sectional");
    }

    #[tokio::test]
    async fn no_active_members_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let (band_id, members) =
            band_with_members(&store, &[MembershipStatus::Inactive]).await;
        let fanout = NotificationFanout::new(store.clone(), Arc::new(LiveUpdates::new()));

        let count = fanout
            .notify(band_id, update_event("Rehearsal canceled: Sectional"))
            .await
            .expect("notify");
        assert_eq!(count, 0);
        let rows = store.notifications_for_user(members[0]).await.expect("rows");
        assert!(rows.is_empty());
    }
}
