//! HTTP application: routes, handlers and layers

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::Extension,
    http::{header, header::HeaderMap, Method},
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use qlkube_kube_client::KubeClient;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::graphql::{BearerToken, QlkubeSchema};
use crate::middleware::honor_no_compression;
use crate::routes::{health_router, HealthState};

/// Path of the GraphQL endpoint
pub const GRAPHQL_PATH: &str = "/graphql";

/// Build the gateway router
///
/// Routes:
/// - `POST /graphql` - Query execution
/// - `GET /graphql` - GraphiQL, when enabled
/// - `/health`, `/health/live`, `/health/ready`
pub fn build_router(schema: QlkubeSchema, client: KubeClient, config: &Config) -> Router {
    let mut graphql = post(graphql_handler);
    if config.graphiql {
        graphql = graphql.get(graphiql);
    }

    Router::new()
        .route("/", get(root))
        .route(GRAPHQL_PATH, graphql)
        // Nested health routes: /health, /health/live, /health/ready
        .nest("/health", health_router(HealthState::new(client)))
        .layer(Extension(schema))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn(honor_no_compression))
        .layer(build_cors_layer(config))
}

/// Build the CORS layer based on configuration.
///
/// In production mode:
/// - If `CORS_ORIGINS` is set, only those origins are allowed
/// - If `CORS_ORIGINS` is not set, CORS requests are rejected (no origins allowed)
///
/// In development mode:
/// - If `CORS_ORIGINS` is set, those origins are used
/// - If `CORS_ORIGINS` is not set, permissive CORS is used for convenience
pub fn build_cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin '{}', skipping", origin);
                        None
                    })
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::error!("No valid CORS origins configured, CORS requests will be rejected");
                CorsLayer::new()
            } else {
                tracing::info!(
                    "CORS configured with {} allowed origin(s): {:?}",
                    allowed_origins.len(),
                    origins
                );
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([
                        header::AUTHORIZATION,
                        header::CONTENT_TYPE,
                        header::ACCEPT,
                        header::ORIGIN,
                    ])
                    .max_age(std::time::Duration::from_secs(3600))
            }
        }
        _ if config.is_production() => {
            tracing::warn!(
                "CORS_ORIGINS not configured in production mode. \
                 CORS requests will be rejected. Set CORS_ORIGINS to allow cross-origin requests."
            );
            CorsLayer::new()
        }
        _ => {
            tracing::warn!(
                "Using permissive CORS in development mode. \
                 Set CORS_ORIGINS for production-like behavior."
            );
            CorsLayer::permissive()
        }
    }
}

/// Extract bearer token from Authorization header (case-insensitive)
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;

    // Reject malformed values like "Bearer <token> <extra>"
    if parts.next().is_some() {
        return None;
    }

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// GraphQL handler that executes queries against the schema
///
/// The caller's bearer token, if any, is placed in the request data so
/// list calls can forward it to the API server.
async fn graphql_handler(
    Extension(schema): Extension<QlkubeSchema>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();

    if let Some(token) = extract_bearer_token(&headers) {
        request = request.data(BearerToken::new(token));
    }

    schema.execute(request).await.into()
}

/// GraphiQL IDE
async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

async fn root() -> &'static str {
    "qlkube - GraphQL for the Kubernetes API"
}
