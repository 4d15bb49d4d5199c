//! Availability declarations and attendance records.
//!
//! # Purpose
//! Members declare whether they can make a rehearsal; managers record who
//! actually showed up. Both writes go through the store's atomic upsert so
//! concurrent calls for the same `(user, rehearsal)` pair converge to a
//! single row with last-writer-wins timestamps.
use crate::auth::identity::Identity;
use crate::engine::{Engine, EngineError, EngineResult};
use crate::model::{Attendance, AttendanceStatus, Availability, AvailabilityStatus};
use chrono::Utc;
use encore_common::ids::{RehearsalId, UserId};

impl Engine {
    /// Declares or revises the caller's availability for one rehearsal.
    /// The row is always keyed by the caller; `response_time` is computed
    /// here, once per call, and echoed in the returned record.
    ///
    /// # Errors
    /// - `NotFound` when the rehearsal does not exist.
    /// - `Unauthorized` unless the caller is a member of the owning band.
    pub async fn set_availability(
        &self,
        identity: Identity,
        rehearsal_id: RehearsalId,
        status: AvailabilityStatus,
    ) -> EngineResult<Availability> {
        let rehearsal = self.store().get_rehearsal(rehearsal_id).await?;
        if !self.authz().is_member(identity, rehearsal.band_id).await? {
            return Err(EngineError::Unauthorized);
        }
        let entry = Availability {
            user_id: identity.user_id,
            rehearsal_id,
            status,
            response_time: Utc::now(),
        };
        Ok(self.store().upsert_availability(entry).await?)
    }

    /// Records whether a member showed up, late, or not at all.
    ///
    /// # Errors
    /// - `NotFound` when the rehearsal does not exist.
    /// - `Unauthorized` unless the caller manages the owning band.
    /// - `Validation` (field `userId`) when the target holds no membership
    ///   row in the band.
    pub async fn record_attendance(
        &self,
        identity: Identity,
        rehearsal_id: RehearsalId,
        user_id: UserId,
        status: AttendanceStatus,
    ) -> EngineResult<Attendance> {
        let rehearsal = self.store().get_rehearsal(rehearsal_id).await?;
        if !self.authz().can_manage(identity, rehearsal.band_id).await? {
            return Err(EngineError::Unauthorized);
        }
        let membership = self.store().membership(rehearsal.band_id, user_id).await?;
        if membership.is_none() {
            return Err(EngineError::validation(
                "userId",
                "user is not a member of this band",
            ));
        }
        let entry = Attendance {
            user_id,
            rehearsal_id,
            status,
            marked_at: Utc::now(),
        };
        Ok(self.store().upsert_attendance(entry).await?)
    }
}
