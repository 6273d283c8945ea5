//! Configuration error types

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required environment variable
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid value for environment variable
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    /// A file referenced by the configuration could not be read
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration validation error
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
