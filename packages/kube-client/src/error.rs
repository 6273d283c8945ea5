//! Kubernetes API error types

use thiserror::Error;

/// Kubernetes API client errors
#[derive(Error, Debug)]
pub enum KubeError {
    /// Client configuration is unusable
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse Kubernetes API response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API server answered with a non-success status
    #[error("Kubernetes API error {status} ({reason}): {message}")]
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    /// Request timeout
    #[error("Request to the Kubernetes API timed out")]
    Timeout,

    /// None of the candidate OpenAPI endpoints returned a document
    #[error("OpenAPI document unavailable from {url}: {last_error}")]
    OpenApiUnavailable { url: String, last_error: String },
}

impl KubeError {
    /// Upstream HTTP status, when the API server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            KubeError::Api { status, .. } => Some(*status),
            KubeError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is retryable (transient failure)
    ///
    /// Retries on timeouts, transport errors, throttling (429) and server
    /// errors (5xx). Client errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            KubeError::Timeout => true,
            KubeError::Api { status, .. } => *status == 429 || *status >= 500,
            KubeError::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                matches!(e.status(), Some(status) if status.is_server_error())
            }
            _ => false,
        }
    }
}

/// Result type for Kubernetes API operations
pub type KubeResult<T> = Result<T, KubeError>;
