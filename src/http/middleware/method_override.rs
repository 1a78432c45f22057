//! HTTP method override.
//!
//! Forms can only send GET and POST. A POST carrying
//! `X-HTTP-Method-Override` is dispatched as the named method. This has to
//! wrap the router (not be a route layer) so it runs before routing.

use axum::{
    extract::Request,
    http::{HeaderName, Method},
    middleware::Next,
    response::Response,
};

pub const X_HTTP_METHOD_OVERRIDE: HeaderName = HeaderName::from_static("x-http-method-override");

const ALLOWED: [Method; 5] = [Method::GET, Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD];

pub async fn method_override(mut request: Request, next: Next) -> Response {
    if request.method() == Method::POST {
        let requested = request
            .headers()
            .get(&X_HTTP_METHOD_OVERRIDE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Method::from_bytes(v.trim().to_ascii_uppercase().as_bytes()).ok())
            .filter(|m| ALLOWED.contains(m));

        if let Some(method) = requested {
            tracing::trace!(method = %method, path = %request.uri().path(), "Method override");
            *request.method_mut() = method;
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        routing::{post, put},
        Router,
    };
    use tower::{Layer, ServiceExt};

    async fn call(method: &str, uri: &str, header: Option<&str>) -> (u16, String) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(h) = header {
            builder = builder.header(&X_HTTP_METHOD_OVERRIDE, h);
        }
        let router = Router::new()
            .route("/put", put(|| async { "put" }))
            .route("/post", post(|| async { "post" }));
        let app = axum::middleware::from_fn(method_override).layer(router);

        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status().as_u16();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn post_with_override_is_dispatched_as_put() {
        assert_eq!(call("POST", "/put", Some("put")).await, (200, "put".to_string()));
    }

    #[tokio::test]
    async fn post_without_override_is_unchanged() {
        assert_eq!(call("POST", "/post", None).await, (200, "post".to_string()));
    }

    #[tokio::test]
    async fn override_ignored_on_get() {
        let (status, _) = call("GET", "/put", Some("PUT")).await;
        assert_eq!(status, 405);
    }
}
