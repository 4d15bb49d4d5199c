//! Identity and authorization.
//!
//! # Purpose
//! `identity` turns gateway headers into an authenticated [`identity::Identity`];
//! `evaluator` decides what that identity may do to a given band.
pub mod evaluator;
pub mod identity;
