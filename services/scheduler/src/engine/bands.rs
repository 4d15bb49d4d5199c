//! Band administration operations.
//!
//! # Purpose
//! Creating a band (founder becomes its ACTIVE manager in the same
//! transaction), listing the bands a caller may see, and inserting or
//! updating membership rows. The core scheduling operations only ever read
//! memberships; this is the one surface that writes them.
use crate::auth::identity::Identity;
use crate::engine::{Engine, EngineError, EngineResult};
use crate::model::{Band, BandRole, Membership, MembershipStatus};
use chrono::Utc;
use encore_common::ids::{BandId, UserId};

/// Input for creating a band.
#[derive(Debug, Clone)]
pub struct BandDraft {
    pub name: String,
}

impl Engine {
    /// Creates a band with the caller as founding ACTIVE `BAND_MANAGER`.
    /// Any authenticated caller may create a band.
    ///
    /// # Errors
    /// - `Validation` on an empty name.
    pub async fn create_band(&self, identity: Identity, draft: BandDraft) -> EngineResult<Band> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(EngineError::validation("name", "name is required"));
        }
        let now = Utc::now();
        let band = Band {
            id: BandId::new(),
            name: name.to_string(),
            created_at: now,
        };
        let founder = Membership {
            band_id: band.id,
            user_id: identity.user_id,
            role: BandRole::BandManager,
            status: MembershipStatus::Active,
            joined_at: now,
        };
        Ok(self.store().create_band(band, founder).await?)
    }

    /// Lists every band for an admin, otherwise the bands the caller holds a
    /// membership in, active or not.
    pub async fn list_bands(&self, identity: Identity) -> EngineResult<Vec<Band>> {
        if identity.is_admin() {
            return Ok(self.store().list_all_bands().await?);
        }
        let band_ids = self.store().band_ids_for_user(identity.user_id).await?;
        Ok(self.store().list_bands(&band_ids).await?)
    }

    /// Inserts or updates the unique `(band_id, user_id)` membership row.
    ///
    /// # Errors
    /// - `NotFound` when the band does not exist.
    /// - `Unauthorized` unless the caller manages the band.
    pub async fn upsert_membership(
        &self,
        identity: Identity,
        band_id: BandId,
        user_id: UserId,
        role: BandRole,
        status: MembershipStatus,
    ) -> EngineResult<Membership> {
        if !self.store().band_exists(band_id).await? {
            return Err(EngineError::NotFound("band".to_string()));
        }
        if !self.authz().can_manage(identity, band_id).await? {
            return Err(EngineError::Unauthorized);
        }
        let membership = Membership {
            band_id,
            user_id,
            role,
            status,
            joined_at: Utc::now(),
        };
        Ok(self.store().upsert_membership(membership).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::Role;
    use crate::engine::LiveUpdates;
    use crate::store::memory::InMemoryStore;
    use crate::store::SchedulerStore;
    use std::sync::Arc;

    fn test_engine() -> (Engine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let engine = Engine::new(store.clone(), Arc::new(LiveUpdates::new()));
        (engine, store)
    }

    fn member(role: Role) -> Identity {
        Identity {
            user_id: UserId::new(),
            role,
        }
    }

    #[tokio::test]
    async fn create_band_rejects_blank_name() {
        let (engine, _) = test_engine();
        let err = engine
            .create_band(
                member(Role::Member),
                BandDraft {
                    name: "   ".to_string(),
                },
            )
            .await
            .expect_err("validation");
        assert!(matches!(
            err,
            EngineError::Validation { field: "name", .. }
        ));
    }

    #[tokio::test]
    async fn founder_becomes_active_manager() {
        let (engine, store) = test_engine();
        let caller = member(Role::Member);
        let band = engine
            .create_band(
                caller,
                BandDraft {
                    name: "  The Offbeats  ".to_string(),
                },
            )
            .await
            .expect("create");
        assert_eq!(band.name, "The Offbeats");

        let row = store
            .membership(band.id, caller.user_id)
            .await
            .expect("lookup")
            .expect("membership row");
        assert_eq!(row.role, BandRole::BandManager);
        assert_eq!(row.status, MembershipStatus::Active);
    }

    #[tokio::test]
    async fn list_bands_scopes_to_memberships_any_status() {
        let (engine, _) = test_engine();
        let founder_a = member(Role::Member);
        let founder_b = member(Role::Member);
        let band_a = engine
            .create_band(
                founder_a,
                BandDraft {
                    name: "Band A".to_string(),
                },
            )
            .await
            .expect("band a");
        engine
            .create_band(
                founder_b,
                BandDraft {
                    name: "Band B".to_string(),
                },
            )
            .await
            .expect("band b");

        // Deactivate the founder; the band must remain visible to them.
        engine
            .upsert_membership(
                founder_a,
                band_a.id,
                founder_a.user_id,
                BandRole::BandManager,
                MembershipStatus::Inactive,
            )
            .await
            .expect("deactivate");

        let visible = engine.list_bands(founder_a).await.expect("list");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, band_a.id);

        let all = engine.list_bands(member(Role::Admin)).await.expect("list");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn membership_less_caller_sees_no_bands() {
        let (engine, _) = test_engine();
        engine
            .create_band(
                member(Role::Member),
                BandDraft {
                    name: "Someone Else's Band".to_string(),
                },
            )
            .await
            .expect("band");
        let visible = engine.list_bands(member(Role::Member)).await.expect("list");
        assert!(visible.is_empty());
    }

    #[tokio::test]
    async fn upsert_membership_requires_management() {
        let (engine, _) = test_engine();
        let founder = member(Role::Member);
        let band = engine
            .create_band(
                founder,
                BandDraft {
                    name: "Guarded".to_string(),
                },
            )
            .await
            .expect("band");

        let outsider = member(Role::Member);
        let err = engine
            .upsert_membership(
                outsider,
                band.id,
                UserId::new(),
                BandRole::Member,
                MembershipStatus::Active,
            )
            .await
            .expect_err("forbidden");
        assert!(matches!(err, EngineError::Unauthorized));
    }

    #[tokio::test]
    async fn upsert_membership_missing_band_is_not_found() {
        let (engine, _) = test_engine();
        let err = engine
            .upsert_membership(
                member(Role::Admin),
                BandId::new(),
                UserId::new(),
                BandRole::Member,
                MembershipStatus::Active,
            )
            .await
            .expect_err("not found");
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn upsert_membership_updates_role_and_keeps_joined_at() {
        let (engine, store) = test_engine();
        let founder = member(Role::Member);
        let band = engine
            .create_band(
                founder,
                BandDraft {
                    name: "Promotions".to_string(),
                },
            )
            .await
            .expect("band");
        let newcomer = UserId::new();
        let first = engine
            .upsert_membership(
                founder,
                band.id,
                newcomer,
                BandRole::Member,
                MembershipStatus::Active,
            )
            .await
            .expect("insert");

        let promoted = engine
            .upsert_membership(
                founder,
                band.id,
                newcomer,
                BandRole::BandManager,
                MembershipStatus::Active,
            )
            .await
            .expect("update");
        assert_eq!(promoted.role, BandRole::BandManager);
        assert_eq!(promoted.joined_at, first.joined_at);

        let row = store
            .membership(band.id, newcomer)
            .await
            .expect("lookup")
            .expect("row");
        assert_eq!(row.role, BandRole::BandManager);
    }
}
