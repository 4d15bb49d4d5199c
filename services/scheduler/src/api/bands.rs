//! Band API handlers.
//!
//! # Purpose
//! HTTP surface for creating bands, listing the caller's bands, and managing
//! memberships. Handlers parse and validate wire input, then delegate to the
//! engine, which owns authorization and persistence.
use crate::api::error::{api_engine_error, api_validation_field, ApiError};
use crate::api::types::{BandCreateRequest, BandListResponse, MembershipUpsertRequest};
use crate::api::{parse_id, AppJson};
use crate::app::AppState;
use crate::auth::identity::identity_from_headers;
use crate::engine::BandDraft;
use crate::model::{Band, BandRole, Membership, MembershipStatus};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

/// List the bands visible to the caller.
///
/// Admins see every band; everyone else sees the bands they hold a
/// membership in, active or not.
pub(crate) async fn list_bands(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BandListResponse>, ApiError> {
    let identity = identity_from_headers(&headers)?;
    let items = state
        .engine
        .list_bands(identity)
        .await
        .map_err(api_engine_error)?;
    Ok(Json(BandListResponse { items }))
}

/// Create a band and enroll the caller as its first active manager.
pub(crate) async fn create_band(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(body): AppJson<BandCreateRequest>,
) -> Result<(StatusCode, Json<Band>), ApiError> {
    let identity = identity_from_headers(&headers)?;
    let band = state
        .engine
        .create_band(identity, BandDraft { name: body.name })
        .await
        .map_err(api_engine_error)?;
    Ok((StatusCode::CREATED, Json(band)))
}

/// Add a member to a band or update an existing membership in place.
pub(crate) async fn upsert_membership(
    Path((band_id, user_id)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(body): AppJson<MembershipUpsertRequest>,
) -> Result<Json<Membership>, ApiError> {
    let identity = identity_from_headers(&headers)?;
    let band_id = parse_id("bandId", &band_id)?;
    let user_id = parse_id("userId", &user_id)?;
    let role = BandRole::parse(&body.role)
        .ok_or_else(|| api_validation_field("role", "must be one of MEMBER, BAND_MANAGER"))?;
    let status = MembershipStatus::parse(&body.status)
        .ok_or_else(|| api_validation_field("status", "must be one of ACTIVE, INACTIVE"))?;
    let membership = state
        .engine
        .upsert_membership(identity, band_id, user_id, role, status)
        .await
        .map_err(api_engine_error)?;
    Ok(Json(membership))
}
