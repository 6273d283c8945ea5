//! Kubernetes API client for qlkube
//!
//! This crate provides the HTTP transport used to reach the Kubernetes API
//! server:
//! - OpenAPI document retrieval, racing the candidate endpoints
//! - JSON list requests with per-call bearer tokens
//! - Server version lookups for readiness checks
//!
//! # Example
//!
//! ```rust,no_run
//! use qlkube_kube_client::KubeClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClient::new("https://127.0.0.1:6443")?;
//!
//! let document = client.fetch_openapi().await?;
//! println!("{} paths", document["paths"].as_object().map_or(0, |p| p.len()));
//!
//! let pods = client
//!     .get_json(["api", "v1", "pods"], &[], Some("my-token"))
//!     .await?;
//! println!("{}", pods["items"]);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod models;

pub use client::{split_path, KubeClient, OPENAPI_PATHS};
pub use error::{KubeError, KubeResult};
pub use models::ServerVersion;
