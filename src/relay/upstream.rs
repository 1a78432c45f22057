//! Upstream transport.
//!
//! # Responsibilities
//! - Resolve request paths against the configured base URL
//! - Apply the per-call timeout and follow redirects
//! - Capture status, body text and Set-Cookie headers
//! - Report exactly one `TransportOutcome` per call
//!
//! # Design Decisions
//! - 4xx/5xx are responses, never failures; they carry a `RawError` instead
//! - Each call runs on its own task; a task that dies without reporting
//!   surfaces as `TransportOutcome::Neither`

use std::time::{Duration, Instant};

use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderValue, Method, StatusCode};
use reqwest::Client;
use serde_json::Value;
use tokio::task::AbortHandle;
use url::Url;

use crate::http::request::X_REQUEST_ID;
use crate::normalize::{HttpResponse, NetworkFailure, RawError, TransportOutcome};
use crate::relay::RelayError;

/// Body sent with an upstream call.
#[derive(Debug, Default)]
pub enum UpstreamBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart(reqwest::multipart::Form),
}

/// Description of one upstream call. Consumed by `UpstreamClient::dispatch`.
#[derive(Debug)]
pub struct UpstreamCall {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: UpstreamBody,
    timeout: Option<Duration>,
    request_id: Option<String>,
}

impl UpstreamCall {
    /// `path` is relative to the base URL and may carry a query string.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: UpstreamBody::Empty,
            timeout: None,
            request_id: None,
        }
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn body(mut self, body: UpstreamBody) -> Self {
        self.body = body;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

/// What the transport hands back for one call.
#[derive(Debug)]
pub struct UpstreamReply {
    pub outcome: TransportOutcome,
    /// Set-Cookie values in the order the upstream sent them.
    pub set_cookies: Vec<HeaderValue>,
    pub content_type: Option<String>,
    pub elapsed: Duration,
}

impl UpstreamReply {
    fn without_response(outcome: TransportOutcome, elapsed: Duration) -> Self {
        Self {
            outcome,
            set_cookies: Vec::new(),
            content_type: None,
            elapsed,
        }
    }

    /// True when the upstream declared a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
    }
}

/// HTTP client bound to one upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(base_url: &str) -> Result<Self, RelayError> {
        let base_url = Url::parse(base_url).map_err(|source| RelayError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        // Default redirect policy follows up to 10 hops.
        let client = Client::builder().no_proxy().build()?;

        Ok(Self { client, base_url })
    }

    /// Resolve a relative path (optionally with `?query`) against the base URL.
    ///
    /// The path never replaces the base URL's origin.
    pub fn url_for(&self, path: &str) -> Url {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };

        let mut url = self.base_url.clone();
        let prefix = self.base_url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", prefix, path.trim_start_matches('/')));
        url.set_query(query.filter(|q| !q.is_empty()));
        url
    }

    /// Run one call to completion on its own task.
    ///
    /// Dropping the returned future aborts the call.
    pub async fn dispatch(&self, call: UpstreamCall) -> UpstreamReply {
        let started = Instant::now();
        let client = self.client.clone();
        let url = self.url_for(&call.path);

        tracing::debug!(method = %call.method, url = %url, "Dispatching upstream call");

        let mut task = tokio::spawn(execute(client, url, call, started));
        let _guard = AbortOnDrop(task.abort_handle());

        match (&mut task).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Upstream task ended without reporting an outcome");
                UpstreamReply::without_response(TransportOutcome::Neither, started.elapsed())
            }
        }
    }
}

/// Aborts the upstream task when the caller stops waiting for it.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn execute(client: Client, url: Url, call: UpstreamCall, started: Instant) -> UpstreamReply {
    let UpstreamCall {
        method,
        path: _,
        query,
        body,
        timeout,
        request_id,
    } = call;

    let mut request = client.request(method.clone(), url.clone());
    if !query.is_empty() {
        request = request.query(&query);
    }
    request = match body {
        UpstreamBody::Empty => request,
        UpstreamBody::Json(value) => request.json(&value),
        UpstreamBody::Form(pairs) => request.form(&pairs),
        UpstreamBody::Multipart(form) => request.multipart(form),
    };
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }
    if let Some(id) = request_id {
        request = request.header(X_REQUEST_ID, id);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            let failure = network_failure(&e, timeout);
            return UpstreamReply::without_response(TransportOutcome::NetworkFailure(failure), started.elapsed());
        }
    };

    let status = response.status();
    let set_cookies: Vec<HeaderValue> = response.headers().get_all(SET_COOKIE).iter().cloned().collect();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let raw_error = response
        .error_for_status_ref()
        .err()
        .map(|e| status_error(&e, &method, response.url(), status));

    let outcome = match response.text().await {
        Ok(body_text) => TransportOutcome::HttpResponse(HttpResponse {
            status: status.as_u16(),
            body_text,
            raw_error,
        }),
        Err(e) => TransportOutcome::NetworkFailure(network_failure(&e, timeout)),
    };

    UpstreamReply {
        outcome,
        set_cookies,
        content_type,
        elapsed: started.elapsed(),
    }
}

fn failure_name(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "TimeoutError"
    } else if error.is_connect() {
        "ConnectionError"
    } else if error.is_redirect() {
        "RedirectError"
    } else if error.is_body() || error.is_decode() {
        "BodyError"
    } else if error.is_builder() {
        "RequestBuilderError"
    } else {
        "RequestError"
    }
}

fn network_failure(error: &reqwest::Error, timeout: Option<Duration>) -> NetworkFailure {
    let message = match timeout {
        Some(limit) if error.is_timeout() => format!("timeout of {}ms exceeded", limit.as_millis()),
        _ => error.to_string(),
    };
    NetworkFailure::from_error(failure_name(error), message, error)
}

fn status_error(error: &reqwest::Error, method: &Method, url: &Url, status: StatusCode) -> RawError {
    let message = format!("cannot {} {} ({})", method, url.path(), status.as_u16());
    RawError::from_error("Error", message, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> UpstreamClient {
        UpstreamClient::new(base).unwrap()
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            UpstreamClient::new("not a url"),
            Err(RelayError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn url_for_joins_paths() {
        let c = client("http://localhost:3000");
        assert_eq!(c.url_for("api-404-error").as_str(), "http://localhost:3000/api-404-error");
        assert_eq!(c.url_for("/get?x=1&y=2").as_str(), "http://localhost:3000/get?x=1&y=2");
        assert_eq!(c.url_for("").as_str(), "http://localhost:3000/");
    }

    #[test]
    fn url_for_keeps_base_prefix_and_origin() {
        let c = client("http://localhost:3000/api/");
        assert_eq!(c.url_for("get").as_str(), "http://localhost:3000/api/get");

        let c = client("http://localhost:3000");
        let url = c.url_for("//evil.example/x");
        assert_eq!(url.host_str(), Some("localhost"));
    }

    #[tokio::test]
    async fn connection_refused_is_network_failure() {
        // Bind then drop to find a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let c = client(&format!("http://{}", addr));
        let reply = c.dispatch(UpstreamCall::new(Method::GET, "/get")).await;
        match reply.outcome {
            TransportOutcome::NetworkFailure(failure) => {
                assert_eq!(failure.name, "ConnectionError");
                assert!(!failure.stack_frames.is_empty());
            }
            other => panic!("expected network failure, got {:?}", other),
        }
        assert!(reply.set_cookies.is_empty());
    }

    #[tokio::test]
    async fn dropping_dispatch_aborts_the_call() {
        use tokio::io::AsyncReadExt;

        // Accepts one connection, never answers, reports when the peer hangs up.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (closed_tx, closed_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            while let Ok(n) = socket.read(&mut buf).await {
                if n == 0 {
                    break;
                }
            }
            let _ = closed_tx.send(());
        });

        let c = client(&format!("http://{}", addr));
        let waited = tokio::time::timeout(
            Duration::from_millis(200),
            c.dispatch(UpstreamCall::new(Method::GET, "/hang")),
        )
        .await;
        assert!(waited.is_err());

        tokio::time::timeout(Duration::from_secs(2), closed_rx)
            .await
            .expect("upstream connection still open")
            .unwrap();
    }
}
