//! API error mapping.
//!
//! # Purpose
//! Converts engine and storage failures into the uniform HTTP error body.
//! Every non-2xx response carries an [`ErrorResponse`] so clients can branch
//! on `code` without sniffing status text.
use crate::api::types::ErrorResponse;
use crate::engine::EngineError;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// An API error response with a status code and JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn error_body(code: &str, message: &str) -> ErrorResponse {
    ErrorResponse {
        code: code.to_string(),
        message: message.to_string(),
        field: None,
        request_id: None,
    }
}

/// Builds a 404 response.
///
/// # What it does
/// Used when a referenced band or rehearsal does not exist.
///
/// # Errors
/// - Does not fail.
pub fn api_not_found(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        body: error_body("not_found", message),
    }
}

/// Builds a 409 response with a specific error code.
pub fn api_conflict(code: &str, message: &str) -> ApiError {
    ApiError {
        status: StatusCode::CONFLICT,
        body: error_body(code, message),
    }
}

/// Builds a 401 response.
///
/// # What it does
/// Used when the identity headers are missing or unparseable.
///
/// # Errors
/// - Does not fail.
pub fn api_unauthorized(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::UNAUTHORIZED,
        body: error_body("unauthorized", message),
    }
}

/// Builds a 403 response.
///
/// # What it does
/// Used when the caller is authenticated but not permitted to act.
///
/// # Errors
/// - Does not fail.
pub fn api_forbidden(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::FORBIDDEN,
        body: error_body("forbidden", message),
    }
}

/// Builds a 400 response for an invalid request payload.
pub fn api_validation_error(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: error_body("validation_error", message),
    }
}

/// Builds a 400 response naming the offending input field.
pub fn api_validation_field(field: &str, message: &str) -> ApiError {
    let mut body = error_body("validation_error", message);
    body.field = Some(field.to_string());
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body,
    }
}

/// Builds a 503 response for a transient storage outage.
pub fn api_transient(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: error_body("transient", message),
    }
}

/// Builds a 500 response and logs the underlying storage error.
///
/// # What it does
/// The storage detail stays in the log; the client sees only the message.
///
/// # Errors
/// - Does not fail.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "scheduler storage error");
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: error_body("internal", message),
    }
}

/// Builds a 500 response without an underlying storage error.
pub fn api_internal_message(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: error_body("internal", message),
    }
}

/// Maps an engine failure onto the HTTP error taxonomy.
///
/// # What it does
/// Validation failures become 400 with the field attached, authorization
/// failures 403, missing records 404, conflicts 409. Transient storage
/// failures become 503 so callers know to retry; anything else is a 500
/// with the detail logged.
///
/// # Errors
/// - Does not fail.
pub fn api_engine_error(err: EngineError) -> ApiError {
    match err {
        EngineError::Validation { field, message } => api_validation_field(field, &message),
        EngineError::Unauthorized => api_forbidden("access denied"),
        EngineError::NotFound(entity) => api_not_found(&format!("{entity} not found")),
        EngineError::Conflict(detail) => api_conflict("conflict", &detail),
        EngineError::Storage(StoreError::Transient(detail)) => {
            tracing::warn!(detail = %detail, "transient storage failure");
            api_transient("storage temporarily unavailable")
        }
        EngineError::Storage(err) => api_internal("storage error", &err),
    }
}
