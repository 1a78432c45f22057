//! Caller-side relay.
//!
//! Mirrors the proxy's normalization for calls a client makes directly.
//! Each call reports through a `Completion` that resolves exactly once.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::http::Method;
use tokio::sync::oneshot;

use crate::normalize::{normalize, ClientPayload, TransportOutcome};
use crate::relay::upstream::{UpstreamBody, UpstreamCall, UpstreamClient, UpstreamReply};
use crate::relay::RelayError;

#[derive(Debug, Clone)]
pub struct ClientRelayConfig {
    /// Base URL of the service being called.
    pub base_url: String,
    /// Timeout for normalized `get` calls.
    pub timeout_ms: u64,
}

impl Default for ClientRelayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientRelay {
    upstream: UpstreamClient,
    timeout: Duration,
}

impl ClientRelay {
    pub fn new(config: ClientRelayConfig) -> Result<Self, RelayError> {
        Ok(Self {
            upstream: UpstreamClient::new(&config.base_url)?,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// GET with full normalization and the bounded timeout.
    pub fn get(&self, path: &str, fields: Vec<(String, String)>) -> Completion {
        let call = UpstreamCall::new(Method::GET, path)
            .query(fields)
            .timeout(Some(self.timeout));
        let upstream = self.upstream.clone();

        Completion::spawn(async move {
            let reply = upstream.dispatch(call).await;
            normalize(reply.outcome).into_payload()
        })
    }

    pub fn post(&self, path: &str, fields: Vec<(String, String)>) -> Completion {
        self.simple(Method::POST, path, UpstreamBody::Form(fields))
    }

    pub fn put(&self, path: &str, fields: Vec<(String, String)>) -> Completion {
        self.simple(Method::PUT, path, UpstreamBody::Form(fields))
    }

    pub fn delete(&self, path: &str, fields: Vec<(String, String)>) -> Completion {
        self.simple(Method::DELETE, path, UpstreamBody::Form(fields))
    }

    pub fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> Completion {
        self.simple(Method::POST, path, UpstreamBody::Multipart(form))
    }

    /// Reduced contract: JSON body if the response is JSON, else the text.
    fn simple(&self, method: Method, path: &str, body: UpstreamBody) -> Completion {
        let call = UpstreamCall::new(method, path).body(body);
        let upstream = self.upstream.clone();

        Completion::spawn(async move { simple_payload(upstream.dispatch(call).await) })
    }
}

fn simple_payload(reply: UpstreamReply) -> ClientPayload {
    let is_json = reply.is_json();
    match reply.outcome {
        TransportOutcome::HttpResponse(http) if is_json => match serde_json::from_str(&http.body_text) {
            Ok(value) => ClientPayload::Json(value),
            Err(_) => ClientPayload::Text(http.body_text),
        },
        TransportOutcome::HttpResponse(http) => ClientPayload::Text(http.body_text),
        other => normalize(other).into_payload(),
    }
}

/// Single-fire completion of a client call.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<ClientPayload>,
}

impl Completion {
    fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = ClientPayload> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let payload = work.await;
            let _ = tx.send(payload);
        });
        Self { rx }
    }
}

impl Future for Completion {
    type Output = ClientPayload;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(payload)) => Poll::Ready(payload),
            // The call's task vanished without reporting.
            Poll::Ready(Err(_)) => Poll::Ready(normalize(TransportOutcome::Neither).into_payload()),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::HttpResponse;
    use serde_json::json;

    fn reply(outcome: TransportOutcome, content_type: Option<&str>) -> UpstreamReply {
        UpstreamReply {
            outcome,
            set_cookies: Vec::new(),
            content_type: content_type.map(str::to_string),
            elapsed: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn completion_resolves_once_with_payload() {
        let completion = Completion::spawn(async { ClientPayload::Text("done".into()) });
        assert_eq!(completion.await, ClientPayload::Text("done".into()));
    }

    #[tokio::test]
    async fn dropped_sender_resolves_as_protocol_violation() {
        let (tx, rx) = oneshot::channel::<ClientPayload>();
        drop(tx);
        let payload = Completion { rx }.await;
        assert_eq!(
            payload,
            ClientPayload::Text("Unknown error: Neither networkError nor response provided".into())
        );
    }

    #[tokio::test]
    async fn panicking_call_resolves_as_protocol_violation() {
        let completion = Completion::spawn(async {
            let crashed = true;
            if crashed {
                panic!("transport crashed");
            }
            ClientPayload::Text("unreachable".into())
        });
        assert!(completion.await.as_text().unwrap().starts_with("Unknown error: "));
    }

    #[test]
    fn simple_payload_uses_json_when_declared() {
        let payload = simple_payload(reply(
            TransportOutcome::HttpResponse(HttpResponse::new(200, r#"{"path":"/post"}"#)),
            Some("application/json; charset=utf-8"),
        ));
        assert_eq!(payload, ClientPayload::Json(json!({"path": "/post"})));
    }

    #[test]
    fn simple_payload_ignores_status() {
        let payload = simple_payload(reply(
            TransportOutcome::HttpResponse(HttpResponse::new(500, "Internal Server Error")),
            Some("text/plain"),
        ));
        assert_eq!(payload, ClientPayload::Text("Internal Server Error".into()));
    }

    #[test]
    fn simple_payload_normalizes_failures() {
        let payload = simple_payload(reply(TransportOutcome::Neither, None));
        assert!(payload.as_text().unwrap().contains("Neither"));
    }

    #[test]
    fn rejects_bad_base_url() {
        let config = ClientRelayConfig {
            base_url: "::".into(),
            ..Default::default()
        };
        assert!(ClientRelay::new(config).is_err());
    }
}
