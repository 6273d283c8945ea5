//! qlkube gateway library
//!
//! This module exposes the gateway components for use in integration tests
//! and as a library.

pub mod app;
pub mod config;
pub mod error;
pub mod graphql;
pub mod middleware;
pub mod routes;

// Re-export commonly used types
pub use app::build_router;
pub use config::Config;
pub use error::{BuildError, BuildResult, ResolverError, ResolverResult};
pub use graphql::{compose_schema, KindRegistry, QlkubeSchema, SchemaComposer};
