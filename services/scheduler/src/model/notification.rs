//! Notification model definitions.
//!
//! # Purpose
//! Defines the append-only notification row written by the fan-out path,
//! one row per recipient per triggering event.
use chrono::{DateTime, Utc};
use encore_common::ids::{NotificationId, RehearsalId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub rehearsal_id: RehearsalId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Update,
    Cancellation,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Update => "UPDATE",
            NotificationKind::Cancellation => "CANCELLATION",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UPDATE" => Some(NotificationKind::Update),
            "CANCELLATION" => Some(NotificationKind::Cancellation),
            _ => None,
        }
    }
}
