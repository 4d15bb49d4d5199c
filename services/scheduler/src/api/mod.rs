//! Scheduler HTTP API module.
//!
//! # Purpose
//! Exposes the route handler modules plus shared request plumbing: an
//! identifier parser that attributes failures to the offending field and a
//! JSON extractor whose rejections use the uniform error body instead of
//! axum's plain-text defaults.
pub mod availability;
pub mod bands;
pub mod error;
pub mod rehearsals;
pub mod system;
pub mod types;

use crate::api::error::{api_validation_error, api_validation_field, ApiError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use std::str::FromStr;

/// Parses a path or payload identifier, reporting the named field on failure.
pub(crate) fn parse_id<T: FromStr>(field: &str, raw: &str) -> Result<T, ApiError> {
    T::from_str(raw).map_err(|_| api_validation_field(field, "must be a UUID"))
}

/// `axum::Json` with rejections mapped onto the `validation_error` body.
pub(crate) struct AppJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(api_validation_error(&rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_common::ids::BandId;

    #[test]
    fn parse_id_names_the_field() {
        let err = parse_id::<BandId>("bandId", "not-a-uuid").expect_err("invalid");
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.body.field.as_deref(), Some("bandId"));

        let id = BandId::new();
        let parsed: BandId = parse_id("bandId", &id.to_string()).expect("valid");
        assert_eq!(parsed, id);
    }
}
