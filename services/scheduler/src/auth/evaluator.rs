//! Authorization decisions for band-scoped operations.
//!
//! # Purpose
//! Answers two questions: may the caller manage a band (create, reschedule,
//! cancel rehearsals, administer members, record attendance) and may the
//! caller view it. Decisions are evaluated per request from the membership
//! row as stored right now; nothing is cached, so a role change takes effect
//! on the next call.
//!
//! A global admin passes both checks for every band. A band manager
//! membership grants management regardless of its status; an inactive
//! manager can still cancel a rehearsal. Visibility requires any membership
//! row at all, active or not.
use crate::auth::identity::{Identity, Role};
use crate::model::{BandRole, Membership};
use crate::store::{SchedulerStore, StoreResult};
use encore_common::ids::BandId;
use std::sync::Arc;

pub struct AuthzEvaluator {
    store: Arc<dyn SchedulerStore>,
}

impl AuthzEvaluator {
    pub fn new(store: Arc<dyn SchedulerStore>) -> Self {
        Self { store }
    }

    /// Whether the caller may manage the band.
    ///
    /// # Errors
    /// - Storage failures from the membership lookup.
    pub async fn can_manage(&self, identity: Identity, band_id: BandId) -> StoreResult<bool> {
        let membership = self.membership_for(identity, band_id).await?;
        Ok(manages_with(identity.role, membership.as_ref()))
    }

    /// Whether the caller may view the band and its rehearsals.
    ///
    /// # Errors
    /// - Storage failures from the membership lookup.
    pub async fn is_member(&self, identity: Identity, band_id: BandId) -> StoreResult<bool> {
        let membership = self.membership_for(identity, band_id).await?;
        Ok(member_with(identity.role, membership.as_ref()))
    }

    // Admins never need the row, so skip the lookup for them.
    async fn membership_for(
        &self,
        identity: Identity,
        band_id: BandId,
    ) -> StoreResult<Option<Membership>> {
        if identity.is_admin() {
            return Ok(None);
        }
        self.store.membership(band_id, identity.user_id).await
    }
}

fn manages_with(role: Role, membership: Option<&Membership>) -> bool {
    if matches!(role, Role::Admin) {
        return true;
    }
    membership.map_or(false, |m| m.role == BandRole::BandManager)
}

fn member_with(role: Role, membership: Option<&Membership>) -> bool {
    matches!(role, Role::Admin) || membership.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Band, MembershipStatus};
    use crate::store::memory::InMemoryStore;
    use chrono::Utc;
    use encore_common::ids::UserId;

    fn membership(band_id: BandId, user_id: UserId, role: BandRole, status: MembershipStatus) -> Membership {
        Membership {
            band_id,
            user_id,
            role,
            status,
            joined_at: Utc::now(),
        }
    }

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: UserId::new(),
            role,
        }
    }

    #[test]
    fn manager_role_grants_management_in_any_status() {
        let band_id = BandId::new();
        let user_id = UserId::new();
        for status in [MembershipStatus::Active, MembershipStatus::Inactive] {
            let row = membership(band_id, user_id, BandRole::BandManager, status);
            assert!(manages_with(Role::Member, Some(&row)));
        }
    }

    #[test]
    fn plain_member_does_not_manage_but_may_view() {
        let row = membership(
            BandId::new(),
            UserId::new(),
            BandRole::Member,
            MembershipStatus::Active,
        );
        assert!(!manages_with(Role::Member, Some(&row)));
        assert!(member_with(Role::Member, Some(&row)));
    }

    #[test]
    fn no_membership_denies_everything_for_regular_callers() {
        assert!(!manages_with(Role::Member, None));
        assert!(!member_with(Role::Member, None));
    }

    #[test]
    fn admin_needs_no_membership() {
        assert!(manages_with(Role::Admin, None));
        assert!(member_with(Role::Admin, None));
    }

    #[tokio::test]
    async fn evaluator_reads_membership_per_call() {
        let store = Arc::new(InMemoryStore::new());
        let band = Band {
            id: BandId::new(),
            name: "The Offbeats".to_string(),
            created_at: Utc::now(),
        };
        let caller = identity(Role::Member);
        let founder = membership(
            band.id,
            UserId::new(),
            BandRole::BandManager,
            MembershipStatus::Active,
        );
        store
            .create_band(band.clone(), founder)
            .await
            .expect("create band");

        let authz = AuthzEvaluator::new(store.clone());
        assert!(!authz.is_member(caller, band.id).await.expect("check"));

        store
            .upsert_membership(membership(
                band.id,
                caller.user_id,
                BandRole::Member,
                MembershipStatus::Active,
            ))
            .await
            .expect("join");

        // No cache: the new row is visible on the very next evaluation.
        assert!(authz.is_member(caller, band.id).await.expect("check"));
        assert!(!authz.can_manage(caller, band.id).await.expect("check"));
    }

    #[tokio::test]
    async fn admin_passes_checks_without_any_rows() {
        let store = Arc::new(InMemoryStore::new());
        let authz = AuthzEvaluator::new(store);
        let admin = identity(Role::Admin);
        let band_id = BandId::new();
        assert!(authz.can_manage(admin, band_id).await.expect("check"));
        assert!(authz.is_member(admin, band_id).await.expect("check"));
    }
}
