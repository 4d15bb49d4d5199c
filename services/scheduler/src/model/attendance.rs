//! Attendance model definitions.
//!
//! # Purpose
//! Defines the manager-recorded attendance row, unique per
//! `(user_id, rehearsal_id)`.
use chrono::{DateTime, Utc};
use encore_common::ids::{RehearsalId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub user_id: UserId,
    pub rehearsal_id: RehearsalId,
    pub status: AttendanceStatus,
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Late => "LATE",
            AttendanceStatus::Absent => "ABSENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PRESENT" => Some(AttendanceStatus::Present),
            "LATE" => Some(AttendanceStatus::Late),
            "ABSENT" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}
