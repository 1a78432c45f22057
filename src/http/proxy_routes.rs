//! Proxy endpoints backed by `ProxyRelay`.

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};

use crate::http::form::FormBody;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::relay::{RelayRequest, UpstreamBody, UpstreamCall};

/// Query key naming the upstream path for `/api-proxy-get-error`.
pub const ERROR_PATH_PARAM: &str = "errorPath";

/// First `errorPath` value in the query, or `""` when absent.
pub fn error_path(query: Option<&str>) -> String {
    url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .find(|(key, _)| key == ERROR_PATH_PARAM)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

fn with_query(path: &str, query: Option<String>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path.to_string(),
    }
}

/// `GET /api-proxy-get` → `GET /get` with the same query.
pub async fn proxy_get(State(state): State<AppState>, headers: HeaderMap, RawQuery(query): RawQuery) -> Response {
    let call = UpstreamCall::new(Method::GET, with_query("/get", query)).request_id(request_id(&headers));
    state.relay.passthrough(RelayRequest::new("api-proxy-get", call)).await
}

/// `POST /api-proxy-post` → `POST /post` with the parsed body as JSON.
pub async fn proxy_post(State(state): State<AppState>, headers: HeaderMap, FormBody(body): FormBody) -> Response {
    let call = UpstreamCall::new(Method::POST, "/post")
        .body(UpstreamBody::Json(body))
        .request_id(request_id(&headers));
    state
        .relay
        .passthrough(RelayRequest::new("api-proxy-post", call).forward_cookies(true))
        .await
}

/// `GET /api-proxy-get-error?errorPath=<p>` → `GET /<p>`, fully normalized.
pub async fn proxy_get_error(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let call = UpstreamCall::new(Method::GET, error_path(query.as_deref())).request_id(request_id(&headers));
    state
        .relay
        .normalized(RelayRequest::new("api-proxy-get-error", call).forward_cookies(true))
        .await
}

/// `GET /api-proxy-redirect` → `GET /api-redirect`, following the redirect.
pub async fn proxy_redirect(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let call = UpstreamCall::new(Method::GET, "/api-redirect").request_id(request_id(&headers));
    state.relay.passthrough(RelayRequest::new("api-proxy-redirect", call)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_query_appends_only_non_empty() {
        assert_eq!(with_query("/get", None), "/get");
        assert_eq!(with_query("/get", Some(String::new())), "/get");
        assert_eq!(with_query("/get", Some("a=1".into())), "/get?a=1");
    }

    #[test]
    fn error_path_defaults_to_empty() {
        assert_eq!(error_path(None), "");
        assert_eq!(error_path(Some("other=1")), "");
    }

    #[test]
    fn error_path_takes_first_value() {
        assert_eq!(error_path(Some("errorPath=api-404-error")), "api-404-error");
        assert_eq!(error_path(Some("errorPath=get&errorPath=api-500-error")), "get");
        assert_eq!(error_path(Some("errorPath=api%2D404%2Derror")), "api-404-error");
    }
}
