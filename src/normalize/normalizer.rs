//! The normalization policy.
//!
//! # Precedence
//! 1. `Neither` → protocol violation
//! 2. network failure → unexpected error, status 500
//! 3. HTTP response:
//!    - status >= 400 with a JSON body → upstream error (passed through)
//!    - status >= 400 with a raw error → unexpected error with response context
//!    - status >= 400 otherwise → protocol violation
//!    - status < 400 → success, JSON if it parses, raw text otherwise

use serde_json::Value;

use crate::normalize::outcome::{ErrorDetails, NormalizedOutcome, Payload};
use crate::normalize::transport::{HttpResponse, NetworkFailure, TransportOutcome};

pub const NEITHER_PROVIDED: &str = "Neither networkError nor response provided";
pub const INVALID_JSON_NO_ERROR: &str = "Invalid JSON and no response.error provided";

/// Status reported when the call never produced a response.
pub const NETWORK_FAILURE_STATUS: u16 = 500;

/// Normalize one transport outcome. Total and side-effect free.
pub fn normalize(outcome: TransportOutcome) -> NormalizedOutcome {
    match outcome {
        TransportOutcome::Neither => NormalizedOutcome::ProtocolViolation {
            message: NEITHER_PROVIDED.to_string(),
        },
        TransportOutcome::NetworkFailure(failure) => from_failure(failure),
        TransportOutcome::HttpResponse(response) => from_response(response),
    }
}

fn from_failure(failure: NetworkFailure) -> NormalizedOutcome {
    NormalizedOutcome::UnexpectedError {
        status: NETWORK_FAILURE_STATUS,
        details: ErrorDetails {
            name: failure.name,
            message: failure.message,
            stack_frames: failure.stack_frames,
            response_text: None,
            response_status: None,
        },
    }
}

fn from_response(response: HttpResponse) -> NormalizedOutcome {
    let HttpResponse {
        status,
        body_text,
        raw_error,
    } = response;
    let parsed_body = parse_body(&body_text);

    if status >= 400 {
        if let Some(payload) = parsed_body {
            return NormalizedOutcome::UpstreamError { status, payload };
        }
        return match raw_error {
            Some(raw) => NormalizedOutcome::UnexpectedError {
                status,
                details: ErrorDetails {
                    stack_frames: raw.stack_frames(),
                    name: raw.name,
                    message: raw.message,
                    response_text: Some(body_text),
                    response_status: Some(status),
                },
            },
            None => NormalizedOutcome::ProtocolViolation {
                message: INVALID_JSON_NO_ERROR.to_string(),
            },
        };
    }

    let payload = match parsed_body {
        Some(value) => Payload::Json(value),
        None => Payload::Text(body_text),
    };
    NormalizedOutcome::Success { status, payload }
}

/// Single JSON parse attempt; failures and a literal `null` are absent.
pub(crate) fn parse_body(body_text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(body_text) {
        Ok(Value::Null) | Err(_) => None,
        Ok(value) => Some(value),
    }
}
