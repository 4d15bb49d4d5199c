//! Rehearsal model definitions and patch/query payloads.
//!
//! # Purpose
//! Defines the rehearsal record, its ordered agenda items, the partial-update
//! payload, and the filtered query shape used by the store and API handlers.
use chrono::{DateTime, Utc};
use encore_common::ids::{BandId, RehearsalId, UserId};
use serde::{Deserialize, Serialize};

use crate::model::{Attendance, Availability, AvailabilityStatus, BandSummary};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Rehearsal {
    pub id: RehearsalId,
    pub band_id: BandId,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub status: RehearsalStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RehearsalStatus {
    Scheduled,
    Canceled,
    Completed,
}

impl RehearsalStatus {
    /// Terminal rehearsals reject any patch that would move them to a
    /// different status.
    pub fn is_terminal(self) -> bool {
        matches!(self, RehearsalStatus::Canceled | RehearsalStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RehearsalStatus::Scheduled => "SCHEDULED",
            RehearsalStatus::Canceled => "CANCELED",
            RehearsalStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SCHEDULED" => Some(RehearsalStatus::Scheduled),
            "CANCELED" => Some(RehearsalStatus::Canceled),
            "COMPLETED" => Some(RehearsalStatus::Completed),
            _ => None,
        }
    }
}

/// Agenda entry owned by a rehearsal. `order_index` is the zero-based
/// position the item was supplied in; items are immutable after creation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgendaItem {
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: u32,
    pub order_index: u32,
}

/// Partial update for a rehearsal. Absent and `null` fields both mean
/// "leave unchanged"; `band_id`, `created_by`, and agenda items are not
/// patchable.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub status: Option<RehearsalStatus>,
}

impl RehearsalPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.location.is_none()
            && self.status.is_none()
    }
}

/// Store-level rehearsal listing filter. `band_ids` is the full set of bands
/// the results may come from; `viewer` selects whose availability status is
/// attached to each summary.
#[derive(Debug, Clone)]
pub struct RehearsalQuery {
    pub band_ids: Vec<BandId>,
    pub status: Option<RehearsalStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub viewer: UserId,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalWithItems {
    #[serde(flatten)]
    pub rehearsal: Rehearsal,
    pub agenda_items: Vec<AgendaItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalSummary {
    #[serde(flatten)]
    pub rehearsal: Rehearsal,
    pub band_name: String,
    pub agenda_items: Vec<AgendaItem>,
    pub my_availability: Option<AvailabilityStatus>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalDetail {
    #[serde(flatten)]
    pub rehearsal: Rehearsal,
    pub band: BandSummary,
    pub agenda_items: Vec<AgendaItem>,
    pub availability: Vec<Availability>,
    pub attendance: Vec<Attendance>,
}
