//! Scheduler HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and testable.
use crate::api;
use crate::engine::Engine;
use crate::observability;
use crate::store::SchedulerStore;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub engine: Arc<Engine>,
    pub store: Arc<dyn SchedulerStore>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/v1/bands",
            axum::routing::get(api::bands::list_bands).post(api::bands::create_band),
        )
        .route(
            "/v1/bands/:band_id/members/:user_id",
            axum::routing::put(api::bands::upsert_membership),
        )
        .route(
            "/v1/rehearsals",
            axum::routing::get(api::rehearsals::list_rehearsals)
                .post(api::rehearsals::create_rehearsal),
        )
        .route(
            "/v1/rehearsals/:rehearsal_id",
            axum::routing::get(api::rehearsals::get_rehearsal)
                .patch(api::rehearsals::update_rehearsal),
        )
        .route(
            "/v1/rehearsals/:rehearsal_id/availability",
            axum::routing::post(api::availability::set_availability),
        )
        .route(
            "/v1/rehearsals/:rehearsal_id/attendance",
            axum::routing::post(api::availability::record_attendance),
        )
        .layer(trace_layer)
        .with_state(state)
}
