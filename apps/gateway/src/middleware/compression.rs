//! Response compression opt-out
//!
//! Responses are gzip-compressed when the client accepts it. A request
//! carrying the `x-no-compression` header is served uncompressed. This
//! middleware must be layered outside `CompressionLayer`.

use axum::{
    body::Body,
    http::{header, header::HeaderName, Request},
    middleware::Next,
    response::Response,
};

static X_NO_COMPRESSION: HeaderName = HeaderName::from_static("x-no-compression");

/// Drop `Accept-Encoding` from requests that opt out of compression
pub async fn honor_no_compression(mut request: Request<Body>, next: Next) -> Response {
    if request.headers().contains_key(&X_NO_COMPRESSION) {
        request.headers_mut().remove(header::ACCEPT_ENCODING);
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;
    use tower_http::compression::CompressionLayer;

    async fn large_body() -> String {
        "kube ".repeat(200)
    }

    fn create_test_app() -> Router {
        Router::new()
            .route("/", get(large_body))
            .layer(CompressionLayer::new())
            .layer(axum::middleware::from_fn(honor_no_compression))
    }

    #[tokio::test]
    async fn test_compresses_by_default() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ACCEPT_ENCODING, "gzip")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get(header::CONTENT_ENCODING).unwrap(), "gzip");
    }

    #[tokio::test]
    async fn test_opt_out_header_disables_compression() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ACCEPT_ENCODING, "gzip")
                    .header("x-no-compression", "1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
    }
}
