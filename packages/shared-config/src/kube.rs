//! Kubernetes API connection configuration

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{get_required_env, parse_env, ConfigError, ConfigResult};

/// API server address as seen from inside a pod
pub const IN_CLUSTER_API_URL: &str = "https://kubernetes.default.svc";

/// Mount point of the pod's service account credentials
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Connection settings for the Kubernetes API server
#[derive(Clone)]
pub struct KubeConfig {
    /// Base URL of the API server
    pub api_url: String,

    /// Service token used to fetch the OpenAPI document (and for all calls
    /// in service auth mode)
    pub token: Option<String>,

    /// Extra root certificate (PEM) trusted for the API server
    pub ca_cert_path: Option<PathBuf>,

    /// Whether the configuration was derived from the pod environment
    pub in_cluster: bool,

    /// Disable TLS certificate verification (development only)
    pub insecure_skip_tls_verify: bool,

    /// Timeout for resource list requests in seconds
    pub request_timeout_secs: u64,

    /// Timeout for each OpenAPI document request in seconds
    pub openapi_timeout_secs: u64,
}

impl std::fmt::Debug for KubeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeConfig")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("ca_cert_path", &self.ca_cert_path)
            .field("in_cluster", &self.in_cluster)
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("openapi_timeout_secs", &self.openapi_timeout_secs)
            .finish()
    }
}

impl KubeConfig {
    /// Load Kubernetes configuration from environment variables
    ///
    /// Unless `IN_CLUSTER` is exactly `false`, credentials are read from the
    /// service account mount. Otherwise `KUBERNETES_HOST` is required and
    /// `KUBE_SCHEMA_TOKEN` / `KUBE_CA_CERT` are optional.
    pub fn from_env() -> ConfigResult<Self> {
        let in_cluster = env::var("IN_CLUSTER").map(|v| v != "false").unwrap_or(true);

        let mut config = if in_cluster {
            Self::from_service_account(Path::new(SERVICE_ACCOUNT_DIR))?
        } else {
            let api_url = get_required_env("KUBERNETES_HOST")?;
            if api_url.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "KUBERNETES_HOST".to_string(),
                    "URL cannot be empty".to_string(),
                ));
            }
            let mut config = Self::new(api_url);
            config.token = env::var("KUBE_SCHEMA_TOKEN").ok().filter(|s| !s.is_empty());
            config.ca_cert_path = env::var("KUBE_CA_CERT")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from);
            config
        };

        config.insecure_skip_tls_verify = parse_env("KUBE_INSECURE_SKIP_TLS_VERIFY", false)?;
        config.request_timeout_secs = timeout_secs("KUBE_REQUEST_TIMEOUT", 30)?;
        config.openapi_timeout_secs = timeout_secs("OPENAPI_TIMEOUT", 5)?;

        Ok(config)
    }

    /// Build an in-cluster configuration from a service account directory
    ///
    /// The `token` file is required; `ca.crt` is used when present.
    pub fn from_service_account(dir: &Path) -> ConfigResult<Self> {
        let token_path = dir.join("token");
        let token = fs::read_to_string(&token_path).map_err(|source| ConfigError::ReadFile {
            path: token_path.display().to_string(),
            source,
        })?;

        let ca_path = dir.join("ca.crt");

        let mut config = Self::new(IN_CLUSTER_API_URL);
        config.in_cluster = true;
        config.token = Some(token.trim().to_string()).filter(|t| !t.is_empty());
        config.ca_cert_path = ca_path.exists().then_some(ca_path);
        Ok(config)
    }

    /// Create a configuration for an API server URL (useful for testing)
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: None,
            ca_cert_path: None,
            in_cluster: false,
            insecure_skip_tls_verify: false,
            request_timeout_secs: 30,
            openapi_timeout_secs: 5,
        }
    }

    /// Set the service token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// A timeout in seconds; zero would fail every request immediately
fn timeout_secs(name: &str, default: u64) -> ConfigResult<u64> {
    match parse_env(name, default)? {
        0 => Err(ConfigError::InvalidValue(
            name.to_string(),
            "timeout must be at least 1 second".to_string(),
        )),
        secs => Ok(secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config() {
        let config = KubeConfig::new("https://10.0.0.1:6443");
        assert_eq!(config.api_url, "https://10.0.0.1:6443");
        assert!(config.token.is_none());
        assert!(!config.in_cluster);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.openapi_timeout_secs, 5);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = KubeConfig::new("https://k8s").with_token("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_service_account() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("token"), "sa-token\n").unwrap();
        fs::write(dir.path().join("ca.crt"), "-----BEGIN CERTIFICATE-----").unwrap();

        let config = KubeConfig::from_service_account(dir.path()).unwrap();
        assert_eq!(config.api_url, IN_CLUSTER_API_URL);
        assert_eq!(config.token.as_deref(), Some("sa-token"));
        assert_eq!(config.ca_cert_path, Some(dir.path().join("ca.crt")));
        assert!(config.in_cluster);
    }

    #[test]
    fn test_from_service_account_without_ca() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("token"), "sa-token").unwrap();

        let config = KubeConfig::from_service_account(dir.path()).unwrap();
        assert!(config.ca_cert_path.is_none());
    }

    #[test]
    fn test_from_service_account_missing_token() {
        let dir = tempfile::tempdir().unwrap();
        let err = KubeConfig::from_service_account(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_out_of_cluster_from_env() {
        temp_env::with_vars(
            [
                ("IN_CLUSTER", Some("false")),
                ("KUBERNETES_HOST", Some("https://127.0.0.1:6443")),
                ("KUBE_SCHEMA_TOKEN", Some("dev-token")),
                ("KUBE_CA_CERT", None),
                ("KUBE_INSECURE_SKIP_TLS_VERIFY", Some("true")),
                ("KUBE_REQUEST_TIMEOUT", None),
                ("OPENAPI_TIMEOUT", Some("2")),
            ],
            || {
                let config = KubeConfig::from_env().unwrap();
                assert_eq!(config.api_url, "https://127.0.0.1:6443");
                assert_eq!(config.token.as_deref(), Some("dev-token"));
                assert!(config.insecure_skip_tls_verify);
                assert_eq!(config.request_timeout_secs, 30);
                assert_eq!(config.openapi_timeout_secs, 2);
            },
        );
    }

    #[test]
    fn test_out_of_cluster_requires_host() {
        temp_env::with_vars(
            [("IN_CLUSTER", Some("false")), ("KUBERNETES_HOST", None::<&str>)],
            || {
                let err = KubeConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::MissingEnvVar(ref name) if name == "KUBERNETES_HOST"));
            },
        );
    }

    #[test]
    fn test_invalid_timeout() {
        temp_env::with_vars(
            [
                ("IN_CLUSTER", Some("false")),
                ("KUBERNETES_HOST", Some("https://127.0.0.1:6443")),
                ("KUBE_REQUEST_TIMEOUT", Some("soon")),
            ],
            || {
                let err = KubeConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "KUBE_REQUEST_TIMEOUT"));
            },
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        for (name, other) in [
            ("KUBE_REQUEST_TIMEOUT", "OPENAPI_TIMEOUT"),
            ("OPENAPI_TIMEOUT", "KUBE_REQUEST_TIMEOUT"),
        ] {
            temp_env::with_vars(
                [
                    ("IN_CLUSTER", Some("false")),
                    ("KUBERNETES_HOST", Some("https://127.0.0.1:6443")),
                    (other, None),
                    (name, Some("0")),
                ],
                || {
                    let err = KubeConfig::from_env().unwrap_err();
                    assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == name));
                },
            );
        }
    }
}
