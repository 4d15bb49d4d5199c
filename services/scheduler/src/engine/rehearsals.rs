//! Rehearsal lifecycle operations.
//!
//! # Purpose
//! List, get, create, and patch rehearsals. Creation and patching follow a
//! fixed order: input validation, then existence, then authorization, then a
//! single atomic store write, then notification fan-out. The fan-out runs
//! after the write committed and reports failure as a warning on the
//! response, never as an operation error.
use crate::auth::identity::Identity;
use crate::engine::notify::FanoutEvent;
use crate::engine::{Engine, EngineError, EngineResult, MutationOutcome};
use crate::model::{
    AgendaItem, NotificationKind, Rehearsal, RehearsalDetail, RehearsalPatch, RehearsalQuery,
    RehearsalStatus, RehearsalSummary, RehearsalWithItems,
};
use chrono::{DateTime, Utc};
use encore_common::ids::{BandId, RehearsalId};

/// Input for creating a rehearsal with its agenda.
#[derive(Debug, Clone)]
pub struct RehearsalDraft {
    pub band_id: BandId,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub agenda_items: Vec<AgendaItemDraft>,
}

#[derive(Debug, Clone)]
pub struct AgendaItemDraft {
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: u32,
}

/// Caller-supplied listing filter, before band scoping is resolved.
#[derive(Debug, Clone, Default)]
pub struct RehearsalFilter {
    pub band_id: Option<BandId>,
    pub status: Option<RehearsalStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Engine {
    /// Lists rehearsals visible to the caller, ordered by start time.
    ///
    /// An explicit `band_id` filter restricts to that band without a
    /// membership check; otherwise the caller's own band set is used and an
    /// empty set yields an empty list, not an error.
    pub async fn list_rehearsals(
        &self,
        identity: Identity,
        filter: RehearsalFilter,
    ) -> EngineResult<Vec<RehearsalSummary>> {
        let band_ids = match filter.band_id {
            Some(band_id) => vec![band_id],
            None => {
                let bands = self.store().band_ids_for_user(identity.user_id).await?;
                if bands.is_empty() {
                    return Ok(Vec::new());
                }
                bands
            }
        };
        let query = RehearsalQuery {
            band_ids,
            status: filter.status,
            from: filter.from,
            to: filter.to,
            viewer: identity.user_id,
        };
        Ok(self.store().list_rehearsals(&query).await?)
    }

    /// Fetches one rehearsal with its band, agenda, availability, and
    /// attendance rows.
    ///
    /// # Errors
    /// - `NotFound` when the rehearsal does not exist.
    /// - `Unauthorized` unless the caller is a member of the owning band.
    pub async fn get_rehearsal(
        &self,
        identity: Identity,
        rehearsal_id: RehearsalId,
    ) -> EngineResult<RehearsalDetail> {
        let detail = self.store().rehearsal_detail(rehearsal_id).await?;
        if !self
            .authz()
            .is_member(identity, detail.rehearsal.band_id)
            .await?
        {
            return Err(EngineError::Unauthorized);
        }
        Ok(detail)
    }

    /// Creates a `SCHEDULED` rehearsal with its agenda items, atomically,
    /// then fans out `UPDATE` notifications to the band's ACTIVE members.
    ///
    /// # Errors
    /// - `Validation` on a blank title, a non-positive time range, or a bad
    ///   agenda item (checked before anything touches the store).
    /// - `NotFound` when the band does not exist.
    /// - `Unauthorized` unless the caller manages the band.
    pub async fn create_rehearsal(
        &self,
        identity: Identity,
        draft: RehearsalDraft,
    ) -> EngineResult<MutationOutcome<RehearsalWithItems>> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(EngineError::validation("title", "title is required"));
        }
        if draft.end_time <= draft.start_time {
            return Err(EngineError::validation(
                "endTime",
                "endTime must be after startTime",
            ));
        }
        let mut items = Vec::with_capacity(draft.agenda_items.len());
        for (index, item) in draft.agenda_items.iter().enumerate() {
            let item_title = item.title.trim();
            if item_title.is_empty() {
                return Err(EngineError::validation(
                    "agendaItems",
                    format!("agenda item {index}: title is required"),
                ));
            }
            if item.duration_minutes < 1 {
                return Err(EngineError::validation(
                    "agendaItems",
                    format!("agenda item {index}: durationMinutes must be at least 1"),
                ));
            }
            items.push(AgendaItem {
                title: item_title.to_string(),
                description: item.description.clone(),
                duration_minutes: item.duration_minutes,
                order_index: index as u32,
            });
        }

        if !self.store().band_exists(draft.band_id).await? {
            return Err(EngineError::NotFound("band".to_string()));
        }
        if !self.authz().can_manage(identity, draft.band_id).await? {
            return Err(EngineError::Unauthorized);
        }

        let now = Utc::now();
        let rehearsal = Rehearsal {
            id: RehearsalId::new(),
            band_id: draft.band_id,
            title: title.to_string(),
            description: draft.description,
            start_time: draft.start_time,
            end_time: draft.end_time,
            location: draft.location,
            status: RehearsalStatus::Scheduled,
            created_by: identity.user_id,
            created_at: now,
            updated_at: now,
        };
        let record = self.store().create_rehearsal(rehearsal, items).await?;

        let fanout_warning = self
            .fanout_or_warn(
                record.rehearsal.band_id,
                FanoutEvent {
                    rehearsal_id: record.rehearsal.id,
                    kind: NotificationKind::Update,
                    message: format!("New rehearsal scheduled: {}", record.rehearsal.title),
                },
            )
            .await;
        Ok(MutationOutcome {
            record,
            fanout_warning,
        })
    }

    /// Applies a partial update as one store write. Cancelling a rehearsal
    /// that was not already canceled fans out `CANCELLATION` notifications
    /// carrying the pre-update title; no other change notifies.
    ///
    /// # Errors
    /// - `NotFound` when the rehearsal does not exist (reported before the
    ///   authorization check).
    /// - `Unauthorized` unless the caller manages the owning band.
    /// - `Validation` on a blank supplied title, a resulting inverted time
    ///   range, or a status change on a terminal rehearsal.
    pub async fn update_rehearsal(
        &self,
        identity: Identity,
        rehearsal_id: RehearsalId,
        patch: RehearsalPatch,
    ) -> EngineResult<MutationOutcome<Rehearsal>> {
        let current = self.store().get_rehearsal(rehearsal_id).await?;
        if !self.authz().can_manage(identity, current.band_id).await? {
            return Err(EngineError::Unauthorized);
        }

        let mut patch = patch;
        if let Some(title) = patch.title.take() {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(EngineError::validation("title", "title is required"));
            }
            patch.title = Some(title);
        }
        // Validate the pair the row would end up with, substituting the
        // untouched side from the stored record.
        let start = patch.start_time.unwrap_or(current.start_time);
        let end = patch.end_time.unwrap_or(current.end_time);
        if end <= start {
            return Err(EngineError::validation(
                "endTime",
                "endTime must be after startTime",
            ));
        }
        if current.status.is_terminal() {
            if let Some(status) = patch.status {
                if status != current.status {
                    return Err(EngineError::validation(
                        "status",
                        format!(
                            "cannot change status of a {} rehearsal",
                            current.status.as_str()
                        ),
                    ));
                }
            }
        }

        let cancels = patch.status == Some(RehearsalStatus::Canceled)
            && current.status != RehearsalStatus::Canceled;
        let record = self
            .store()
            .update_rehearsal(rehearsal_id, &patch, Utc::now())
            .await?;

        let fanout_warning = if cancels {
            self.fanout_or_warn(
                record.band_id,
                FanoutEvent {
                    rehearsal_id: record.id,
                    kind: NotificationKind::Cancellation,
                    message: format!("Rehearsal canceled: {}", current.title),
                },
            )
            .await
        } else {
            None
        };
        Ok(MutationOutcome {
            record,
            fanout_warning,
        })
    }
}
