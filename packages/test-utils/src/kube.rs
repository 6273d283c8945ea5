//! Mock Kubernetes API server
//!
//! Provides a [`MockKubeServer`] that simulates the API server endpoints
//! qlkube talks to: OpenAPI discovery, resource lists and `/version`.

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock Kubernetes API server
///
/// Wraps a [`wiremock::MockServer`]. OpenAPI and version mocks require the
/// service token; list mocks accept any caller unless mounted with
/// [`MockKubeServer::mock_list_with_token`]. Expectations set through
/// [`MockKubeServer::mock_list_expect`] are verified when the server drops.
///
/// # Example
///
/// ```rust,ignore
/// use qlkube_test_utils::{resource_list, MockKubeServer, OpenApiFixture};
///
/// #[tokio::test]
/// async fn test_pods() {
///     let server = MockKubeServer::start().await;
///     server.mock_openapi(OpenApiFixture::kubernetes().build()).await;
///     server
///         .mock_list("/api/v1/pods", resource_list("PodList", &[("web", Some("default"))]))
///         .await;
///
///     // Configure your client with server.url() and server.token()
/// }
/// ```
pub struct MockKubeServer {
    server: MockServer,
    token: String,
}

impl MockKubeServer {
    /// Start a new mock API server with the default service token
    pub async fn start() -> Self {
        Self::start_with_token("test-service-token").await
    }

    /// Start a new mock API server with a custom service token
    pub async fn start_with_token(token: &str) -> Self {
        Self {
            server: MockServer::start().await,
            token: token.to_string(),
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Get the service token
    pub fn token(&self) -> &str {
        &self.token
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Serve `document` at `/openapi/v2`
    pub async fn mock_openapi(&self, document: Value) {
        Mock::given(method("GET"))
            .and(path("/openapi/v2"))
            .and(header("Authorization", self.bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(document))
            .mount(&self.server)
            .await;
    }

    /// Serve `document` at `/swagger.json`
    pub async fn mock_swagger(&self, document: Value) {
        Mock::given(method("GET"))
            .and(path("/swagger.json"))
            .and(header("Authorization", self.bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(document))
            .mount(&self.server)
            .await;
    }

    /// Answer `/openapi/v2` with 404
    pub async fn mock_openapi_unavailable(&self) {
        self.mock_status("/openapi/v2", 404, "NotFound", "the server could not find the requested resource")
            .await;
    }

    /// Answer `/swagger.json` with 404
    pub async fn mock_swagger_unavailable(&self) {
        self.mock_status("/swagger.json", 404, "NotFound", "the server could not find the requested resource")
            .await;
    }

    /// Serve a list body at `list_path` for any caller
    pub async fn mock_list(&self, list_path: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(list_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve a list body at `list_path` and expect exactly `times` requests
    pub async fn mock_list_expect(&self, list_path: &str, body: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path(list_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Serve a list body at `list_path` only to requests bearing `token`
    pub async fn mock_list_with_token(&self, list_path: &str, token: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(list_path))
            .and(header("Authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve a list body at `list_path` only when query parameter `name`
    /// equals `value`
    pub async fn mock_list_with_query(&self, list_path: &str, name: &str, value: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(list_path))
            .and(query_param(name, value))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer `status_path` with a Kubernetes `Status` failure body
    pub async fn mock_status(&self, status_path: &str, code: u16, reason: &str, message: &str) {
        Mock::given(method("GET"))
            .and(path(status_path))
            .respond_with(ResponseTemplate::new(code).set_body_json(json!({
                "kind": "Status",
                "apiVersion": "v1",
                "metadata": {},
                "status": "Failure",
                "message": message,
                "reason": reason,
                "code": code
            })))
            .mount(&self.server)
            .await;
    }

    /// Serve `/version` for the service token
    pub async fn mock_version(&self, git_version: &str) {
        let minor = git_version.split('.').nth(1).unwrap_or("0");
        Mock::given(method("GET"))
            .and(path("/version"))
            .and(header("Authorization", self.bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "major": "1",
                "minor": minor,
                "gitVersion": git_version,
                "platform": "linux/amd64"
            })))
            .mount(&self.server)
            .await;
    }

    /// Paths of every request received so far, in arrival order
    pub async fn received_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }
}
