//! Membership model definitions.
//!
//! # Purpose
//! Defines the unique `(band_id, user_id)` membership row plus the closed
//! role and status enums every permission decision is made from.
use chrono::{DateTime, Utc};
use encore_common::ids::{BandId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub band_id: BandId,
    pub user_id: UserId,
    pub role: BandRole,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BandRole {
    Member,
    BandManager,
}

impl BandRole {
    pub fn as_str(self) -> &'static str {
        match self {
            BandRole::Member => "MEMBER",
            BandRole::BandManager => "BAND_MANAGER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MEMBER" => Some(BandRole::Member),
            "BAND_MANAGER" => Some(BandRole::BandManager),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipStatus {
    Active,
    Inactive,
}

impl MembershipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipStatus::Active => "ACTIVE",
            MembershipStatus::Inactive => "INACTIVE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(MembershipStatus::Active),
            "INACTIVE" => Some(MembershipStatus::Inactive),
            _ => None,
        }
    }
}
