//! Scheduler service library crate.
//!
//! # Purpose
//! Exposes the scheduling API surface, domain model, engine, and storage
//! implementations for use by the binary and tests.
//!
//! # Notes
//! Module boundaries mirror the HTTP API, the engine seams, and the storage
//! backends for clarity.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod engine;
pub mod model;
pub mod observability;
pub mod store;
