//! Server-side relay.
//!
//! # Responsibilities
//! - Issue the upstream call with the configured timeout
//! - Normalize the outcome and write it as an HTTP response
//! - Forward upstream Set-Cookie headers verbatim
//!
//! # Design Decisions
//! - The response status echoes the upstream status where one exists
//! - Protocol violations are written as 200 + plain message (observed
//!   behavior of the service this relay fronts, kept for that branch only)

use std::time::Duration;

use axum::{
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::normalize::normalizer::parse_body;
use crate::normalize::outcome::UNKNOWN_ERROR_PREFIX;
use crate::normalize::{normalize, NormalizedOutcome, Payload, TransportOutcome};
use crate::observability::metrics;
use crate::relay::upstream::{UpstreamCall, UpstreamClient};
use crate::relay::RelayError;

/// One proxied request: the upstream call plus how to relay it.
#[derive(Debug)]
pub struct RelayRequest {
    route: &'static str,
    call: UpstreamCall,
    forward_cookies: bool,
}

impl RelayRequest {
    /// `route` labels logs and metrics.
    pub fn new(route: &'static str, call: UpstreamCall) -> Self {
        Self {
            route,
            call,
            forward_cookies: false,
        }
    }

    pub fn forward_cookies(mut self, forward: bool) -> Self {
        self.forward_cookies = forward;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ProxyRelay {
    upstream: UpstreamClient,
    timeout: Duration,
    passthrough_timeout: Option<Duration>,
}

impl ProxyRelay {
    pub fn new(config: &UpstreamConfig) -> Result<Self, RelayError> {
        Ok(Self {
            upstream: UpstreamClient::new(&config.base_url)?,
            timeout: Duration::from_millis(config.timeout_ms),
            passthrough_timeout: config.passthrough_timeout_ms.map(Duration::from_millis),
        })
    }

    /// Relay with full normalization and the bounded timeout.
    pub async fn normalized(&self, request: RelayRequest) -> Response {
        let RelayRequest {
            route,
            call,
            forward_cookies,
        } = request;

        let reply = self.upstream.dispatch(call.timeout(Some(self.timeout))).await;
        let outcome = normalize(reply.outcome);

        log_outcome(route, &outcome);
        metrics::record_outcome(route, outcome.kind(), reply.elapsed);

        let mut response = render(outcome);
        if forward_cookies {
            forward_set_cookies(&reply.set_cookies, response.headers_mut());
        }
        response
    }

    /// Relay a simple route: the upstream JSON body (or `null`) with status 200.
    ///
    /// Transport failures still go through normalization so the caller sees
    /// a diagnostic instead of an empty body.
    pub async fn passthrough(&self, request: RelayRequest) -> Response {
        let RelayRequest {
            route,
            call,
            forward_cookies,
        } = request;

        let reply = self.upstream.dispatch(call.timeout(self.passthrough_timeout)).await;

        let mut response = match reply.outcome {
            TransportOutcome::HttpResponse(http) => {
                tracing::debug!(route, status = http.status, "Passthrough response");
                metrics::record_outcome(route, "passthrough", reply.elapsed);
                Json(parse_body(&http.body_text).unwrap_or(Value::Null)).into_response()
            }
            other => {
                let outcome = normalize(other);
                log_outcome(route, &outcome);
                metrics::record_outcome(route, outcome.kind(), reply.elapsed);
                render(outcome)
            }
        };

        if forward_cookies {
            forward_set_cookies(&reply.set_cookies, response.headers_mut());
        }
        response
    }
}

/// Write a normalized outcome as an HTTP response.
pub fn render(outcome: NormalizedOutcome) -> Response {
    match outcome {
        NormalizedOutcome::Success { status, payload } => match payload {
            // A bare JSON string goes out as its text, like any non-JSON body.
            Payload::Json(Value::String(text)) => (status_code(status), Html(text)).into_response(),
            Payload::Json(value) => (status_code(status), Json(value)).into_response(),
            Payload::Text(text) => (status_code(status), Html(text)).into_response(),
        },
        NormalizedOutcome::UpstreamError { status, payload } => {
            (status_code(status), Json(payload)).into_response()
        }
        NormalizedOutcome::UnexpectedError { status, details } => {
            (status_code(status), Json(details)).into_response()
        }
        NormalizedOutcome::ProtocolViolation { message } => {
            (StatusCode::OK, Html(format!("{}{}", UNKNOWN_ERROR_PREFIX, message))).into_response()
        }
    }
}

/// Append each upstream Set-Cookie value, in order, without merging.
pub fn forward_set_cookies(set_cookies: &[HeaderValue], headers: &mut HeaderMap) {
    for value in set_cookies {
        headers.append(SET_COOKIE, value.clone());
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn log_outcome(route: &'static str, outcome: &NormalizedOutcome) {
    match outcome {
        NormalizedOutcome::ProtocolViolation { message } => {
            tracing::warn!(route, message = %message, "Upstream protocol violation");
        }
        NormalizedOutcome::UnexpectedError { status, details } => {
            tracing::error!(
                route,
                status,
                name = %details.name,
                message = %details.message,
                "Unexpected upstream error"
            );
        }
        other => {
            tracing::debug!(route, kind = other.kind(), status = ?other.status(), "Relayed upstream response");
        }
    }
}
