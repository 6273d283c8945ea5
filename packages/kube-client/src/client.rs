//! Kubernetes API client implementation

use std::fmt;
use std::time::Duration;

use futures_util::future::select_ok;
use qlkube_shared_config::KubeConfig;
use reqwest::{Certificate, Client, Response};
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::{KubeError, KubeResult};
use crate::models::{ServerVersion, Status};

/// Candidate locations of the OpenAPI v2 document, raced against each other
pub const OPENAPI_PATHS: [&str; 2] = ["/openapi/v2", "/swagger.json"];

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Kubernetes API client
#[derive(Clone)]
pub struct KubeClient {
    http_client: Client,
    base_url: Url,
    service_token: Option<String>,
    openapi_timeout: Duration,
}

impl fmt::Debug for KubeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeClient")
            .field("base_url", &self.base_url.as_str())
            .field(
                "service_token",
                &self.service_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("openapi_timeout", &self.openapi_timeout)
            .finish()
    }
}

impl KubeClient {
    /// Create a client for an API server URL with default settings and no
    /// service token
    pub fn new(api_url: &str) -> KubeResult<Self> {
        Self::from_config(&KubeConfig::new(api_url))
    }

    /// Create a client from connection settings
    ///
    /// # Errors
    /// Returns `KubeError::InvalidConfig` if the URL cannot be used as a base
    /// or the CA certificate cannot be read.
    pub fn from_config(config: &KubeConfig) -> KubeResult<Self> {
        let base_url = Url::parse(&config.api_url).map_err(|e| {
            KubeError::InvalidConfig(format!("invalid API URL '{}': {}", config.api_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(KubeError::InvalidConfig(format!(
                "API URL '{}' cannot be used as a base URL",
                config.api_url
            )));
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("qlkube/", env!("CARGO_PKG_VERSION")));

        if let Some(path) = &config.ca_cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                KubeError::InvalidConfig(format!(
                    "failed to read CA certificate {}: {}",
                    path.display(),
                    e
                ))
            })?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }

        if config.insecure_skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http_client: builder.build()?,
            base_url,
            service_token: config.token.clone(),
            openapi_timeout: Duration::from_secs(config.openapi_timeout_secs),
        })
    }

    /// Base URL of the API server
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The token this client was configured with, if any
    pub fn service_token(&self) -> Option<&str> {
        self.service_token.as_deref()
    }

    /// Build an absolute URL from path segments
    ///
    /// Segments are percent-encoded, so a segment can never escape into a
    /// different path.
    pub fn endpoint<I, S>(&self, segments: I) -> KubeResult<Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                KubeError::InvalidConfig(format!(
                    "API URL '{}' cannot be used as a base URL",
                    self.base_url
                ))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Fetch the OpenAPI v2 document
    ///
    /// All candidate paths are requested concurrently with the service token
    /// and the first successful response wins; the remaining requests are
    /// dropped.
    ///
    /// # Errors
    /// Returns `KubeError::OpenApiUnavailable` when every candidate fails.
    pub async fn fetch_openapi(&self) -> KubeResult<Value> {
        let attempts = OPENAPI_PATHS
            .iter()
            .map(|path| Box::pin(self.fetch_openapi_from(path)));

        match select_ok(attempts).await {
            Ok((document, _pending)) => Ok(document),
            Err(e) => Err(KubeError::OpenApiUnavailable {
                url: self.base_url.to_string(),
                last_error: e.to_string(),
            }),
        }
    }

    async fn fetch_openapi_from(&self, path: &'static str) -> KubeResult<Value> {
        let result = async {
            let url = self.endpoint(split_path(path))?;
            let mut request = self.http_client.get(url).timeout(self.openapi_timeout);
            if let Some(token) = &self.service_token {
                request = request.bearer_auth(token);
            }
            let response = request.send().await.map_err(map_send_error)?;
            read_json(response).await
        }
        .await;

        match &result {
            Ok(_) => info!(
                url = %self.base_url,
                path,
                "Retrieved OpenAPI document from this path"
            ),
            Err(e) => info!(
                url = %self.base_url,
                path,
                error = %e,
                "Failed to retrieve OpenAPI document from this path"
            ),
        }

        result
    }

    /// Issue a GET request and decode the JSON body
    ///
    /// `token` is sent as a bearer token when present; no other credentials
    /// are added.
    ///
    /// # Errors
    /// - `KubeError::Api` - If the API server answers with a non-2xx status
    /// - `KubeError::Timeout` - If the request times out
    /// - `KubeError::Http` / `KubeError::Parse` - Transport or decoding failures
    #[instrument(skip_all)]
    pub async fn get_json<I, S>(
        &self,
        segments: I,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> KubeResult<Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let url = self.endpoint(segments)?;
        debug!(path = url.path(), params = query.len(), "Requesting Kubernetes API");

        let mut request = self.http_client.get(url).query(query);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_send_error)?;
        read_json(response).await
    }

    /// Fetch the API server build information with the service token
    pub async fn version(&self) -> KubeResult<ServerVersion> {
        let value = self
            .get_json(["version"], &[], self.service_token())
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Split an absolute API path into its segments
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn map_send_error(e: reqwest::Error) -> KubeError {
    if e.is_timeout() {
        KubeError::Timeout
    } else {
        KubeError::Http(e)
    }
}

async fn read_json(response: Response) -> KubeResult<Value> {
    let status = response.status();
    let text = response.text().await.map_err(map_send_error)?;

    if !status.is_success() {
        let canonical = status.canonical_reason().unwrap_or("Unknown").to_string();
        let (reason, message) = match serde_json::from_str::<Status>(&text) {
            Ok(body) if !body.reason.is_empty() => (body.reason, body.message),
            Ok(body) => (canonical, body.message),
            Err(_) => (canonical, text),
        };
        return Err(KubeError::Api {
            status: status.as_u16(),
            reason,
            message,
        });
    }

    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use qlkube_test_utils::{resource_list, MockKubeServer, OpenApiFixture};

    fn client_for(server: &MockKubeServer) -> KubeClient {
        let config = KubeConfig::new(server.url()).with_token(server.token());
        KubeClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_client_rejects_invalid_url() {
        let result = KubeClient::new("not a url");
        assert_matches!(result, Err(KubeError::InvalidConfig(_)));
    }

    #[test]
    fn test_client_rejects_missing_ca_file() {
        let mut config = KubeConfig::new("https://127.0.0.1:6443");
        config.ca_cert_path = Some("/nonexistent/ca.crt".into());
        assert_matches!(
            KubeClient::from_config(&config),
            Err(KubeError::InvalidConfig(_))
        );
    }

    #[test]
    fn test_client_debug_redacts_token() {
        let config = KubeConfig::new("https://127.0.0.1:6443").with_token("secret-token");
        let client = KubeClient::from_config(&config).unwrap();
        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("secret-token"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = KubeClient::new("https://127.0.0.1:6443").unwrap();
        let url = client
            .endpoint(["api", "v1", "namespaces", "kube-system", "pods"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://127.0.0.1:6443/api/v1/namespaces/kube-system/pods"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes() {
        let client = KubeClient::new("https://proxy.local/k8s/").unwrap();
        let url = client.endpoint(["api", "v1", "namespaces", "a/b c"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://proxy.local/k8s/api/v1/namespaces/a%2Fb%20c"
        );
    }

    #[test]
    fn test_split_path() {
        let segments: Vec<_> = split_path("/apis/apps/v1/deployments").collect();
        assert_eq!(segments, vec!["apis", "apps", "v1", "deployments"]);
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(KubeError::Timeout.is_retryable());
        let throttled = KubeError::Api {
            status: 429,
            reason: "TooManyRequests".to_string(),
            message: String::new(),
        };
        assert!(throttled.is_retryable());
        let forbidden = KubeError::Api {
            status: 403,
            reason: "Forbidden".to_string(),
            message: String::new(),
        };
        assert!(!forbidden.is_retryable());
        assert_eq!(forbidden.status(), Some(403));
    }

    #[tokio::test]
    async fn test_fetch_openapi_primary_path() {
        let server = MockKubeServer::start().await;
        server.mock_openapi(OpenApiFixture::kubernetes().build()).await;
        server.mock_swagger_unavailable().await;

        let document = client_for(&server).fetch_openapi().await.unwrap();
        assert_eq!(document["swagger"], "2.0");
        assert!(document["paths"]["/api/v1/pods"].is_object());
    }

    #[tokio::test]
    async fn test_fetch_openapi_falls_back_to_swagger_json() {
        let server = MockKubeServer::start().await;
        server.mock_openapi_unavailable().await;
        server.mock_swagger(OpenApiFixture::kubernetes().build()).await;

        let document = client_for(&server).fetch_openapi().await.unwrap();
        assert_eq!(document["swagger"], "2.0");
    }

    #[tokio::test]
    async fn test_fetch_openapi_all_paths_fail() {
        let server = MockKubeServer::start().await;
        server.mock_openapi_unavailable().await;
        server.mock_swagger_unavailable().await;

        let result = client_for(&server).fetch_openapi().await;
        assert_matches!(result, Err(KubeError::OpenApiUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_get_json_sends_token_and_query() {
        let server = MockKubeServer::start().await;
        let list = resource_list("PodList", &[("coredns", Some("kube-system"))]);
        server
            .mock_list_with_query(
                "/api/v1/namespaces/kube-system/pods",
                "labelSelector",
                "k8s-app=kube-dns",
                list.clone(),
            )
            .await;

        let client = client_for(&server);
        let body = client
            .get_json(
                ["api", "v1", "namespaces", "kube-system", "pods"],
                &[("labelSelector", "k8s-app=kube-dns".to_string())],
                Some(server.token()),
            )
            .await
            .unwrap();
        assert_eq!(body, list);
    }

    #[tokio::test]
    async fn test_get_json_maps_status_errors() {
        let server = MockKubeServer::start().await;
        server
            .mock_status(
                "/api/v1/pods",
                403,
                "Forbidden",
                "pods is forbidden: User \"system:anonymous\" cannot list resource",
            )
            .await;

        let result = client_for(&server)
            .get_json(["api", "v1", "pods"], &[], None)
            .await;
        assert_matches!(
            result,
            Err(KubeError::Api { status: 403, ref reason, ref message })
                if reason == "Forbidden" && message.contains("forbidden")
        );
    }

    #[tokio::test]
    async fn test_version() {
        let server = MockKubeServer::start().await;
        server.mock_version("v1.29.2").await;

        let version = client_for(&server).version().await.unwrap();
        assert_eq!(version.git_version, "v1.29.2");
        assert_eq!(version.major, "1");
    }
}
