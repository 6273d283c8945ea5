//! Shared configuration types for qlkube services
//!
//! This crate provides the configuration shared by the gateway binary and
//! its tooling: environment mode, logging defaults and the Kubernetes API
//! connection settings.

mod error;
mod kube;

pub use error::{ConfigError, ConfigResult};
pub use kube::{KubeConfig, IN_CLUSTER_API_URL, SERVICE_ACCOUNT_DIR};

use std::env;

/// Common configuration shared between all services
#[derive(Debug, Clone)]
pub struct CommonConfig {
    /// Kubernetes API connection settings
    pub kube: KubeConfig,

    /// Environment mode (development, staging, production)
    pub environment: Environment,

    /// Log level (from RUST_LOG or LOG_LEVEL)
    pub log_level: String,
}

/// Application environment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        })
    }
}

impl Environment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl CommonConfig {
    /// Load common configuration from environment variables
    ///
    /// Skipping TLS verification is refused in production.
    pub fn from_env() -> ConfigResult<Self> {
        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .parse()
            .unwrap_or_default();

        let kube = KubeConfig::from_env()?;
        if kube.insecure_skip_tls_verify {
            if environment.is_production() {
                return Err(ConfigError::ValidationError(
                    "KUBE_INSECURE_SKIP_TLS_VERIFY cannot be enabled in production".to_string(),
                ));
            }
            tracing::warn!("TLS verification of the Kubernetes API server is disabled");
        }

        Ok(Self {
            kube,
            environment,
            log_level: env::var("RUST_LOG")
                .or_else(|_| env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Helper function to get a required environment variable
pub fn get_required_env(name: &str) -> ConfigResult<String> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Helper function to parse an environment variable into a specific type
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "prod".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "staging".parse::<Environment>().unwrap(),
            Environment::Staging
        );
        assert_eq!(
            "anything".parse::<Environment>().unwrap(),
            Environment::Development
        );
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(format!("{}", Environment::Production), "production");
        assert_eq!(format!("{}", Environment::Staging), "staging");
        assert_eq!(format!("{}", Environment::Development), "development");
    }

    #[test]
    fn test_insecure_tls_rejected_in_production() {
        temp_env::with_vars(
            [
                ("ENVIRONMENT", Some("production")),
                ("IN_CLUSTER", Some("false")),
                ("KUBERNETES_HOST", Some("https://127.0.0.1:6443")),
                ("KUBE_INSECURE_SKIP_TLS_VERIFY", Some("true")),
            ],
            || {
                let err = CommonConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::ValidationError(_)));
            },
        );
    }

    #[test]
    fn test_log_level_fallback() {
        temp_env::with_vars(
            [
                ("ENVIRONMENT", None),
                ("IN_CLUSTER", Some("false")),
                ("KUBERNETES_HOST", Some("https://127.0.0.1:6443")),
                ("KUBE_INSECURE_SKIP_TLS_VERIFY", None),
                ("RUST_LOG", None),
                ("LOG_LEVEL", Some("warn")),
            ],
            || {
                let config = CommonConfig::from_env().unwrap();
                assert_eq!(config.log_level, "warn");
                assert_eq!(config.environment, Environment::Development);
            },
        );
    }
}
