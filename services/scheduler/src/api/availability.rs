//! Availability and attendance API handlers.
//!
//! # Purpose
//! Lets members declare whether they can make a rehearsal and lets managers
//! record who actually showed up. Both operations are upserts keyed by
//! `(user, rehearsal)`, so repeated submissions converge on one row.
use crate::api::error::{api_engine_error, api_validation_field, ApiError};
use crate::api::types::{AttendanceRequest, AvailabilityRequest};
use crate::api::{parse_id, AppJson};
use crate::app::AppState;
use crate::auth::identity::identity_from_headers;
use crate::model::{Attendance, AttendanceStatus, Availability, AvailabilityStatus};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

/// Declare the caller's availability for a rehearsal.
pub(crate) async fn set_availability(
    Path(rehearsal_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(body): AppJson<AvailabilityRequest>,
) -> Result<Json<Availability>, ApiError> {
    let identity = identity_from_headers(&headers)?;
    let rehearsal_id = parse_id("rehearsalId", &rehearsal_id)?;
    let status = AvailabilityStatus::parse(&body.status)
        .ok_or_else(|| api_validation_field("status", "must be one of AVAILABLE, UNAVAILABLE, MAYBE"))?;
    let availability = state
        .engine
        .set_availability(identity, rehearsal_id, status)
        .await
        .map_err(api_engine_error)?;
    Ok(Json(availability))
}

/// Record attendance for a band member. Manager only.
pub(crate) async fn record_attendance(
    Path(rehearsal_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(body): AppJson<AttendanceRequest>,
) -> Result<Json<Attendance>, ApiError> {
    let identity = identity_from_headers(&headers)?;
    let rehearsal_id = parse_id("rehearsalId", &rehearsal_id)?;
    let user_id = parse_id("userId", &body.user_id)?;
    let status = AttendanceStatus::parse(&body.status)
        .ok_or_else(|| api_validation_field("status", "must be one of PRESENT, LATE, ABSENT"))?;
    let attendance = state
        .engine
        .record_attendance(identity, rehearsal_id, user_id, status)
        .await
        .map_err(api_engine_error)?;
    Ok(Json(attendance))
}
