//! Error handling for the qlkube gateway
//!
//! Two families of errors exist:
//! - [`BuildError`]: configuration problems found while building the schema
//!   at startup. These are fatal.
//! - [`ResolverError`]: failures of a single field resolution. These surface
//!   as field-level GraphQL errors carrying a `code` extension.

use async_graphql::ErrorExtensions;
use qlkube_kube_client::KubeError;
use thiserror::Error;

/// Errors raised while constructing the decorated schema
#[derive(Error, Debug)]
pub enum BuildError {
    /// A registered kind names an operation the base schema does not have
    #[error("operation '{operation}' required by kind '{kind}' is missing from the base schema")]
    MissingOperation { kind: String, operation: String },

    /// The two operations of a kind return different types
    #[error(
        "kind '{kind}' pairs '{all_namespaces}' ({all_namespaces_type}) with \
         '{namespaced}' ({namespaced_type}); both must return the same type"
    )]
    ReturnTypeMismatch {
        kind: String,
        all_namespaces: String,
        all_namespaces_type: String,
        namespaced: String,
        namespaced_type: String,
    },

    /// Duplicate names or a schema rejected by the GraphQL engine
    #[error("schema composition failed: {0}")]
    SchemaComposition(String),

    /// The OpenAPI document cannot be turned into a base schema
    #[error("invalid OpenAPI document: {0}")]
    InvalidOpenApi(String),
}

/// Result type alias for schema construction
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while resolving a field
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The Kubernetes API call failed
    #[error(transparent)]
    Kube(#[from] KubeError),

    /// A required argument was not supplied
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// An upstream payload does not have the shape the resolver relies on
    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(String),
}

impl ResolverError {
    /// Get the error code string for client-side handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Kube(KubeError::Api { status: 401, .. }) => "UNAUTHENTICATED",
            Self::Kube(KubeError::Api { status: 403, .. }) => "FORBIDDEN",
            Self::Kube(KubeError::Api { status: 404, .. }) => "NOT_FOUND",
            Self::Kube(KubeError::Api { .. }) => "UPSTREAM_ERROR",
            Self::Kube(KubeError::Timeout) => "UPSTREAM_TIMEOUT",
            Self::Kube(KubeError::Parse(_)) => "UNEXPECTED_PAYLOAD",
            Self::Kube(_) => "UPSTREAM_UNAVAILABLE",
            Self::MissingArgument(_) => "BAD_USER_INPUT",
            Self::UnexpectedShape(_) => "UNEXPECTED_PAYLOAD",
        }
    }

    /// Upstream HTTP status, when the API server answered
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Kube(e) => e.status(),
            _ => None,
        }
    }

    /// Log the error with severity based on who is at fault
    pub fn log(&self) {
        match self.upstream_status() {
            Some(status) if status < 500 => tracing::debug!(
                error = %self,
                code = self.error_code(),
                status,
                "Upstream rejected request"
            ),
            _ if matches!(self, Self::MissingArgument(_)) => tracing::debug!(
                error = %self,
                code = self.error_code(),
                "Client error"
            ),
            status => tracing::warn!(
                error = %self,
                code = self.error_code(),
                status = ?status,
                retryable = matches!(self, Self::Kube(e) if e.is_retryable()),
                "Resolver failed"
            ),
        }
    }

    /// Log and convert into a field-level GraphQL error
    pub fn into_graphql(self) -> async_graphql::Error {
        self.log();
        self.extend()
    }
}

impl ErrorExtensions for ResolverError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.error_code();
        let status = self.upstream_status();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", code);
            if let Some(status) = status {
                e.set("status", i32::from(status));
            }
        })
    }
}

/// Result type alias for resolver operations
pub type ResolverResult<T> = Result<T, ResolverError>;
