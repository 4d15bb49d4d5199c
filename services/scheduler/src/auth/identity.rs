//! Caller identity derived from gateway headers.
//!
//! # Purpose
//! The scheduler sits behind a gateway that authenticates users and forwards
//! the result as headers. `x-user-id` must carry the caller's UUID; requests
//! without it are rejected as unauthorized. `x-user-role` grants the global
//! admin role only for the exact value `ADMIN`; any other value, or no
//! header at all, means a regular member.
use crate::api::error::{api_unauthorized, ApiError};
use axum::http::HeaderMap;
use encore_common::ids::UserId;
use std::str::FromStr;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Global role forwarded by the gateway. Distinct from per-band roles,
/// which live on the membership rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
}

/// The authenticated caller for one request.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Reads the caller identity from the request headers.
///
/// # What it does
/// Parses `x-user-id` into a [`UserId`] and maps `x-user-role` onto [`Role`].
///
/// # Errors
/// - 401 unauthorized when the user header is missing or not a UUID.
pub fn identity_from_headers(headers: &HeaderMap) -> Result<Identity, ApiError> {
    let raw = header_str(headers, USER_ID_HEADER)
        .ok_or_else(|| api_unauthorized("missing x-user-id header"))?;
    let user_id =
        UserId::from_str(raw).map_err(|_| api_unauthorized("x-user-id must be a UUID"))?;
    let role = match header_str(headers, USER_ROLE_HEADER) {
        Some("ADMIN") => Role::Admin,
        _ => Role::Member,
    };
    Ok(Identity { user_id, role })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}
