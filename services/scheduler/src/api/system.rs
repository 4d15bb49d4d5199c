//! System/health API handlers.
//!
//! # Purpose and responsibility
//! Provides lightweight endpoints for service metadata and health checks.
//!
//! # Where it fits in the scheduler
//! Used by probes, the gateway, and automation to discover capabilities and
//! verify that the backing store is reachable.
//!
//! # Key invariants and assumptions
//! - Health checks must be fast and side-effect free.
//! - System info is derived from in-memory configuration.
use crate::api::error::{api_internal, api_transient, ApiError};
use crate::api::types::{FeatureFlags, HealthStatus, SystemInfo};
use crate::app::AppState;
use crate::store::StoreError;
use axum::extract::State;
use axum::Json;

/// Return scheduler identity and feature flags.
///
/// # What it does
/// Exposes API version, the storage backend in use, and feature toggles.
///
/// # Errors
/// - Does not return errors.
pub(crate) async fn system_info(State(state): State<AppState>) -> Json<SystemInfo> {
    // Build the response from in-memory configuration (no I/O).
    Json(SystemInfo {
        api_version: state.api_version.clone(),
        backend: state.store.backend_name().to_string(),
        features: FeatureFlags {
            durable_storage: state.store.is_durable(),
            live_updates: true,
        },
    })
}

/// Return scheduler health status.
///
/// # What it does
/// Probes the backing store and returns `ok` if healthy.
///
/// # Errors
/// - Returns 503 when the store is transiently unreachable, 500 otherwise.
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    match state.store.health_check().await {
        Ok(()) => Ok(Json(HealthStatus {
            status: "ok".to_string(),
        })),
        Err(StoreError::Transient(detail)) => {
            tracing::warn!(detail = %detail, "storage health probe failed");
            Err(api_transient("storage unavailable"))
        }
        Err(err) => Err(api_internal("storage unavailable", &err)),
    }
}
