//! Common test utilities for gateway integration tests
//!
//! Builds the full router against a [`MockKubeServer`] serving the stock
//! Kubernetes OpenAPI fixture.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use qlkube_gateway::config::Config;
use qlkube_gateway::graphql::{
    AuthMode, BaseSchema, KindRegistry, KubeListResolver, OperationResolver, SchemaComposer,
};
use qlkube_gateway::build_router;
use qlkube_kube_client::KubeClient;
use qlkube_shared_config::KubeConfig;
use qlkube_test_utils::{MockKubeServer, OpenApiFixture};
use serde_json::{json, Value};

/// A gateway wired to a mock API server
pub struct TestGateway {
    pub server: MockKubeServer,
    pub app: Router,
}

/// Start a mock API server and build the gateway against it
pub async fn start_gateway(configure: impl FnOnce(&mut Config)) -> TestGateway {
    let server = MockKubeServer::start().await;
    server.mock_openapi(OpenApiFixture::kubernetes().build()).await;

    let mut config = Config::for_kube(KubeConfig::new(server.url()).with_token(server.token()));
    configure(&mut config);

    let client = KubeClient::from_config(&config.common.kube).unwrap();
    let document = client.fetch_openapi().await.unwrap();

    let auth_mode = config.auth_mode;
    let resolver_client = client.clone();
    let base = BaseSchema::from_openapi(&document, move |operation| {
        Arc::new(KubeListResolver::new(resolver_client.clone(), operation, auth_mode))
            as Arc<dyn OperationResolver>
    })
    .unwrap();
    let schema = SchemaComposer::new(base)
        .registry(KindRegistry::kubernetes())
        .compose()
        .unwrap();

    TestGateway {
        app: build_router(schema, client, &config),
        server,
    }
}

/// Gateway forwarding caller credentials
pub async fn forwarding_gateway() -> TestGateway {
    start_gateway(|config| config.auth_mode = AuthMode::Forward).await
}

/// Build a `POST /graphql` request
pub fn graphql_request(query: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap()
}

/// Parse response body as generic JSON Value
pub async fn parse_body_value(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
