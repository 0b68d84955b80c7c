//! made-dash: filter composition, query orchestration and benchmark derivation
//! for the MADE developer-activity dashboard.
//!
//! The [`filters::FilterStore`] owns the persisted filter spec. The
//! [`query::QueryOrchestrator`] turns spec changes into debounced, parallel
//! backend fetches and publishes a [`query::DashboardState`]. Benchmark tiers
//! and the productivity multiplier are derived from each Amplifier bundle.

pub mod benchmark;
pub mod comparison;
pub mod data;
pub mod error;
pub mod filters;
pub mod productivity;
pub mod query;
pub mod sync;
