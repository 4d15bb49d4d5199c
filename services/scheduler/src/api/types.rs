//! HTTP API request/response types.
//!
//! # Purpose
//! Defines the payload shapes for the scheduler REST API. Identifier and
//! enum fields arrive as strings and are parsed by the handlers so malformed
//! values produce a validation error naming the offending field; instants
//! deserialize directly as RFC 3339.
use crate::model::{Band, Rehearsal, RehearsalSummary, RehearsalWithItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub durable_storage: bool,
    pub live_updates: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub api_version: String,
    pub backend: String,
    pub features: FeatureFlags,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Set for validation errors to name the offending input field.
    pub field: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BandCreateRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BandListResponse {
    pub items: Vec<Band>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MembershipUpsertRequest {
    pub role: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AgendaItemRequest {
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalCreateRequest {
    pub band_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    #[serde(default)]
    pub agenda_items: Vec<AgendaItemRequest>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalPatchRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalListResponse {
    pub items: Vec<RehearsalSummary>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalCreateResponse {
    #[serde(flatten)]
    pub rehearsal: RehearsalWithItems,
    pub fanout_warning: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalUpdateResponse {
    #[serde(flatten)]
    pub rehearsal: Rehearsal,
    pub fanout_warning: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub user_id: String,
    pub status: String,
}
