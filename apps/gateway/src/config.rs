//! Gateway configuration

use std::env;

use anyhow::{Context, Result};
use qlkube_shared_config::{parse_env, CommonConfig, Environment, KubeConfig};

use crate::graphql::AuthMode;

/// Default listen port
pub const DEFAULT_PORT: u16 = 49020;

/// Gateway configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Server port (default: 49020)
    pub port: u16,

    /// Credentials sent with list calls (default: forward)
    pub auth_mode: AuthMode,

    /// Serve GraphiQL on `GET /graphql` (default: on outside production)
    pub graphiql: bool,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        let is_production = common.environment.is_production();

        Ok(Self {
            common,

            port: parse_env("LISTEN_PORT", DEFAULT_PORT).context("Invalid LISTEN_PORT value")?,

            auth_mode: parse_env("AUTH_MODE", AuthMode::default())
                .context("Invalid AUTH_MODE value")?,

            graphiql: parse_env("GRAPHIQL", !is_production).context("Invalid GRAPHIQL value")?,

            cors_allowed_origins: env::var("CORS_ORIGINS").ok().map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
        })
    }

    /// Configuration for a given API server with defaults everywhere else
    pub fn for_kube(kube: KubeConfig) -> Self {
        Self {
            common: CommonConfig {
                kube,
                environment: Environment::Development,
                log_level: "info".to_string(),
            },
            port: DEFAULT_PORT,
            auth_mode: AuthMode::default(),
            graphiql: true,
            cors_allowed_origins: None,
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLUSTER: [(&str, Option<&str>); 2] = [
        ("IN_CLUSTER", Some("false")),
        ("KUBERNETES_HOST", Some("http://127.0.0.1:8001")),
    ];

    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let all: Vec<(&str, Option<&str>)> = CLUSTER.iter().chain(vars).copied().collect();
        temp_env::with_vars(all, f);
    }

    #[test]
    fn test_defaults() {
        with_env(
            &[
                ("ENVIRONMENT", None),
                ("LISTEN_PORT", None),
                ("AUTH_MODE", None),
                ("GRAPHIQL", None),
                ("CORS_ORIGINS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.port, 49020);
                assert_eq!(config.auth_mode, AuthMode::Forward);
                assert!(config.graphiql);
                assert!(config.cors_allowed_origins.is_none());
                assert_eq!(config.common.kube.api_url, "http://127.0.0.1:8001");
            },
        );
    }

    #[test]
    fn test_overrides() {
        with_env(
            &[
                ("LISTEN_PORT", Some("8080")),
                ("AUTH_MODE", Some("service")),
                ("GRAPHIQL", Some("false")),
                ("CORS_ORIGINS", Some("https://a.example, ,https://b.example")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.port, 8080);
                assert_eq!(config.auth_mode, AuthMode::Service);
                assert!(!config.graphiql);
                assert_eq!(
                    config.cors_allowed_origins,
                    Some(vec![
                        "https://a.example".to_string(),
                        "https://b.example".to_string()
                    ])
                );
            },
        );
    }

    #[test]
    fn test_graphiql_off_in_production() {
        with_env(
            &[("ENVIRONMENT", Some("production")), ("GRAPHIQL", None)],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.is_production());
                assert!(!config.graphiql);
            },
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        with_env(&[("AUTH_MODE", Some("anonymous"))], || {
            let err = Config::from_env().unwrap_err().to_string();
            assert!(err.contains("AUTH_MODE"));
        });
        with_env(&[("LISTEN_PORT", Some("not-a-port"))], || {
            assert!(Config::from_env().is_err());
        });
    }
}
