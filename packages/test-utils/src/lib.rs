//! Shared test utilities for the qlkube workspace
//!
//! This crate provides a mock Kubernetes API server and matching fixtures so
//! the client and gateway test suites run without a cluster.
//!
//! # Mock Services
//!
//! - [`MockKubeServer`] - Mock API server for OpenAPI discovery and list calls
//!
//! # Fixtures
//!
//! - [`OpenApiFixture`] - Swagger 2.0 documents with Kubernetes-style list operations
//! - [`resource_list`] - Minimal list payloads
//! - [`KUBE_KINDS`] - The operation pairs qlkube aggregates by default
//!
//! # Example
//!
//! ```rust,ignore
//! use qlkube_test_utils::{MockKubeServer, OpenApiFixture};
//!
//! #[tokio::test]
//! async fn test_with_mocks() {
//!     let server = MockKubeServer::start().await;
//!     server.mock_openapi(OpenApiFixture::kubernetes().build()).await;
//!
//!     // Use server.url() and server.token() to configure your client
//! }
//! ```

mod fixtures;
mod kube;

pub use fixtures::{resource_list, ListKindFixture, OpenApiFixture, KUBE_KINDS};
pub use kube::MockKubeServer;
