//! Scheduling engine: rehearsal lifecycle, availability reconciliation,
//! band administration, and notification fan-out.
//!
//! # Purpose
//! Every operation the HTTP surface exposes is implemented here against the
//! `SchedulerStore` trait, so the engine is testable without a router and
//! the handlers stay thin adapters. Authorization decisions flow through the
//! `AuthzEvaluator`; notification fan-out runs after the primary mutation
//! commits and its failure is reported as a warning, never as an error.
use crate::auth::evaluator::AuthzEvaluator;
use crate::store::{SchedulerStore, StoreError};
use encore_common::ids::BandId;
use std::sync::Arc;
use thiserror::Error;

mod availability;
mod bands;
pub mod live;
mod notify;
mod rehearsals;

pub use bands::BandDraft;
pub use live::{LiveUpdates, RehearsalEvent};
pub use notify::NotificationFanout;
pub use rehearsals::{AgendaItemDraft, RehearsalDraft, RehearsalFilter};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("access denied")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Storage(StoreError),
}

impl EngineError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => EngineError::NotFound(entity),
            StoreError::Conflict(detail) => EngineError::Conflict(detail),
            other => EngineError::Storage(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Result of a mutation that attempts notification fan-out afterwards.
/// `fanout_warning` is set when the primary mutation committed but the
/// notifications could not be written.
#[derive(Debug, Clone)]
pub struct MutationOutcome<T> {
    pub record: T,
    pub fanout_warning: Option<String>,
}

/// The scheduling engine. One instance is shared across all request handlers.
pub struct Engine {
    store: Arc<dyn SchedulerStore>,
    authz: AuthzEvaluator,
    fanout: NotificationFanout,
}

impl Engine {
    pub fn new(store: Arc<dyn SchedulerStore>, live: Arc<LiveUpdates>) -> Self {
        Self {
            authz: AuthzEvaluator::new(Arc::clone(&store)),
            fanout: NotificationFanout::new(Arc::clone(&store), live),
            store,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn SchedulerStore> {
        &self.store
    }

    pub(crate) fn authz(&self) -> &AuthzEvaluator {
        &self.authz
    }

    /// Run fan-out for a committed mutation. Failure is logged and counted,
    /// then reported to the caller as a warning string; it never fails the
    /// operation that already committed.
    pub(crate) async fn fanout_or_warn(
        &self,
        band_id: BandId,
        event: notify::FanoutEvent,
    ) -> Option<String> {
        match self.fanout.notify(band_id, event).await {
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(error = ?err, band_id = %band_id, "notification fan-out failed");
                metrics::counter!("encore_notification_fanout_failures_total").increment(1);
                Some("failed to deliver rehearsal notifications".to_string())
            }
        }
    }
}
