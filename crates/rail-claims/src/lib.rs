//! Compensation determination for disrupted rail journeys.
//!
//! The [`claims`] module holds the pure engine: exemption profiles, eligibility
//! and override resolution, downgrade refunds, the claim waterfall, form routing
//! and the per-contract path. Tables are loaded once through [`claims::tables`]
//! and shared read-only between computations.

pub mod claims;
pub mod config;
pub mod error;
pub mod telemetry;
