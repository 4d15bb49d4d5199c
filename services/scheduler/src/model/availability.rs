//! Availability model definitions.
//!
//! # Purpose
//! Defines the per-member availability declaration, unique per
//! `(user_id, rehearsal_id)` with last-writer-wins `response_time`.
use chrono::{DateTime, Utc};
use encore_common::ids::{RehearsalId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub user_id: UserId,
    pub rehearsal_id: RehearsalId,
    pub status: AvailabilityStatus,
    pub response_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
    Maybe,
}

impl AvailabilityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "AVAILABLE",
            AvailabilityStatus::Unavailable => "UNAVAILABLE",
            AvailabilityStatus::Maybe => "MAYBE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AVAILABLE" => Some(AvailabilityStatus::Available),
            "UNAVAILABLE" => Some(AvailabilityStatus::Unavailable),
            "MAYBE" => Some(AvailabilityStatus::Maybe),
            _ => None,
        }
    }
}
