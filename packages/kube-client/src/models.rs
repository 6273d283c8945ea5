//! Kubernetes API response models

use serde::{Deserialize, Serialize};

/// Build information reported by `GET /version`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerVersion {
    pub major: String,
    pub minor: String,
    pub git_version: String,
    #[serde(default)]
    pub platform: Option<String>,
}

/// `Status` object returned by the API server on failures
#[derive(Debug, Deserialize)]
pub(crate) struct Status {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reason: String,
}
