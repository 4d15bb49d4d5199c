//! Rehearsal API handlers.
//!
//! # Purpose
//! HTTP surface for scheduling, listing, inspecting, and amending rehearsals.
//! Handlers turn wire strings into typed ids and enums, then hand off to the
//! engine; notification fanout outcomes ride back on the mutation responses
//! as an optional warning instead of failing the request.
use std::collections::HashMap;

use crate::api::error::{api_engine_error, api_validation_field, ApiError};
use crate::api::types::{
    RehearsalCreateRequest, RehearsalCreateResponse, RehearsalListResponse, RehearsalPatchRequest,
    RehearsalUpdateResponse,
};
use crate::api::{parse_id, AppJson};
use crate::app::AppState;
use crate::auth::identity::identity_from_headers;
use crate::engine::{AgendaItemDraft, RehearsalDraft, RehearsalFilter};
use crate::model::{RehearsalDetail, RehearsalPatch, RehearsalStatus};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};

/// List rehearsals, earliest start time first.
///
/// Without a `bandId` filter the result covers every band the caller belongs
/// to. Optional `status`, `from`, and `to` parameters narrow the window.
pub(crate) async fn list_rehearsals(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RehearsalListResponse>, ApiError> {
    let identity = identity_from_headers(&headers)?;
    let mut filter = RehearsalFilter::default();
    if let Some(raw) = params.get("bandId") {
        filter.band_id = Some(parse_id("bandId", raw)?);
    }
    if let Some(raw) = params.get("status") {
        filter.status = Some(RehearsalStatus::parse(raw).ok_or_else(|| {
            api_validation_field("status", "must be one of SCHEDULED, CANCELED, COMPLETED")
        })?);
    }
    if let Some(raw) = params.get("from") {
        filter.from = Some(parse_instant("from", raw)?);
    }
    if let Some(raw) = params.get("to") {
        filter.to = Some(parse_instant("to", raw)?);
    }
    let items = state
        .engine
        .list_rehearsals(identity, filter)
        .await
        .map_err(api_engine_error)?;
    Ok(Json(RehearsalListResponse { items }))
}

/// Schedule a rehearsal with its agenda and notify the band.
pub(crate) async fn create_rehearsal(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(body): AppJson<RehearsalCreateRequest>,
) -> Result<(StatusCode, Json<RehearsalCreateResponse>), ApiError> {
    let identity = identity_from_headers(&headers)?;
    let band_id = parse_id("bandId", &body.band_id)?;
    let draft = RehearsalDraft {
        band_id,
        title: body.title,
        description: body.description,
        start_time: body.start_time,
        end_time: body.end_time,
        location: body.location,
        agenda_items: body
            .agenda_items
            .into_iter()
            .map(|item| AgendaItemDraft {
                title: item.title,
                description: item.description,
                duration_minutes: item.duration_minutes,
            })
            .collect(),
    };
    let outcome = state
        .engine
        .create_rehearsal(identity, draft)
        .await
        .map_err(api_engine_error)?;
    Ok((
        StatusCode::CREATED,
        Json(RehearsalCreateResponse {
            rehearsal: outcome.record,
            fanout_warning: outcome.fanout_warning,
        }),
    ))
}

/// Fetch the full picture of one rehearsal.
///
/// The detail view bundles the band summary, the ordered agenda, and every
/// availability and attendance row recorded so far.
pub(crate) async fn get_rehearsal(
    Path(rehearsal_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RehearsalDetail>, ApiError> {
    let identity = identity_from_headers(&headers)?;
    let rehearsal_id = parse_id("rehearsalId", &rehearsal_id)?;
    let detail = state
        .engine
        .get_rehearsal(identity, rehearsal_id)
        .await
        .map_err(api_engine_error)?;
    Ok(Json(detail))
}

/// Apply a partial update to a rehearsal.
///
/// Transitioning into `CANCELED` triggers a cancellation notice to active
/// members; other edits do not notify.
pub(crate) async fn update_rehearsal(
    Path(rehearsal_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(body): AppJson<RehearsalPatchRequest>,
) -> Result<Json<RehearsalUpdateResponse>, ApiError> {
    let identity = identity_from_headers(&headers)?;
    let rehearsal_id = parse_id("rehearsalId", &rehearsal_id)?;
    let status = match body.status {
        Some(raw) => Some(RehearsalStatus::parse(&raw).ok_or_else(|| {
            api_validation_field("status", "must be one of SCHEDULED, CANCELED, COMPLETED")
        })?),
        None => None,
    };
    let patch = RehearsalPatch {
        title: body.title,
        description: body.description,
        start_time: body.start_time,
        end_time: body.end_time,
        location: body.location,
        status,
    };
    let outcome = state
        .engine
        .update_rehearsal(identity, rehearsal_id, patch)
        .await
        .map_err(api_engine_error)?;
    Ok(Json(RehearsalUpdateResponse {
        rehearsal: outcome.record,
        fanout_warning: outcome.fanout_warning,
    }))
}

fn parse_instant(field: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| api_validation_field(field, "must be an RFC 3339 timestamp"))
}
