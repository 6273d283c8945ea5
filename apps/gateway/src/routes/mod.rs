//! HTTP route handlers for the qlkube gateway
//!
//! - Health check and readiness endpoints

pub mod health;

pub use health::{health_router, HealthState};
