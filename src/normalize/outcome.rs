//! Normalized outcomes and the payloads derived from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix used whenever a protocol violation is shown to a caller.
pub const UNKNOWN_ERROR_PREFIX: &str = "Unknown error: ";

/// The deterministic result of normalizing one transport outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedOutcome {
    /// Status below 400; parsed JSON or the raw body text.
    Success { status: u16, payload: Payload },
    /// Status 400 or above with a JSON body the upstream chose to send.
    UpstreamError { status: u16, payload: Value },
    /// A failure wrapped with diagnostic context.
    UnexpectedError { status: u16, details: ErrorDetails },
    /// A state the transport contract forbids.
    ProtocolViolation { message: String },
}

impl NormalizedOutcome {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::UpstreamError { .. } => "upstream_error",
            Self::UnexpectedError { .. } => "unexpected_error",
            Self::ProtocolViolation { .. } => "protocol_violation",
        }
    }

    /// Status carried by the outcome. Protocol violations carry none.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. }
            | Self::UpstreamError { status, .. }
            | Self::UnexpectedError { status, .. } => Some(*status),
            Self::ProtocolViolation { .. } => None,
        }
    }

    /// Collapse the outcome into what a client continuation receives.
    pub fn into_payload(self) -> ClientPayload {
        match self {
            Self::Success { payload, .. } => match payload {
                Payload::Json(value) => ClientPayload::Json(value),
                Payload::Text(text) => ClientPayload::Text(text),
            },
            Self::UpstreamError { payload, .. } => ClientPayload::Json(payload),
            Self::UnexpectedError { details, .. } => ClientPayload::Json(details.to_json()),
            Self::ProtocolViolation { message } => {
                ClientPayload::Text(format!("{}{}", UNKNOWN_ERROR_PREFIX, message))
            }
        }
    }
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    Text(String),
}

/// Diagnostic context for an unexpected error.
///
/// Serialized with the field names callers already parse: `stack`,
/// `responseText`, `responseStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub name: String,
    pub message: String,
    #[serde(rename = "stack")]
    pub stack_frames: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub response_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub response_status: Option<u16>,
}

impl ErrorDetails {
    pub fn to_json(&self) -> Value {
        // Only strings, string lists and integers; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// The single value delivered to a client-side continuation.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientPayload {
    Json(Value),
    Text(String),
}

impl ClientPayload {
    /// Render for display: structured values as pretty JSON inside `<pre>`,
    /// text verbatim.
    pub fn render(&self) -> String {
        match self {
            Self::Json(Value::String(text)) | Self::Text(text) => text.clone(),
            Self::Json(value) => {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                format!("<pre>{}</pre>", pretty)
            }
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details() -> ErrorDetails {
        ErrorDetails {
            name: "Error".into(),
            message: "boom".into(),
            stack_frames: vec!["Error: boom".into(), "    caused by: io".into()],
            response_text: Some("<html>fail</html>".into()),
            response_status: Some(500),
        }
    }

    #[test]
    fn details_wire_format() {
        assert_eq!(
            details().to_json(),
            json!({
                "name": "Error",
                "message": "boom",
                "stack": ["Error: boom", "    caused by: io"],
                "responseText": "<html>fail</html>",
                "responseStatus": 500,
            })
        );
    }

    #[test]
    fn details_omit_absent_response_fields() {
        let mut d = details();
        d.response_text = None;
        d.response_status = None;
        let value = d.to_json();
        assert!(value.get("responseText").is_none());
        assert!(value.get("responseStatus").is_none());
    }

    #[test]
    fn payload_mapping_per_kind() {
        let ok = NormalizedOutcome::Success {
            status: 200,
            payload: Payload::Text("<html>ok</html>".into()),
        };
        assert_eq!(ok.into_payload(), ClientPayload::Text("<html>ok</html>".into()));

        let upstream = NormalizedOutcome::UpstreamError {
            status: 404,
            payload: json!({"success": false}),
        };
        assert_eq!(upstream.into_payload(), ClientPayload::Json(json!({"success": false})));

        let violation = NormalizedOutcome::ProtocolViolation {
            message: "Neither networkError nor response provided".into(),
        };
        assert_eq!(
            violation.into_payload(),
            ClientPayload::Text("Unknown error: Neither networkError nor response provided".into())
        );
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let outcome = NormalizedOutcome::UpstreamError {
            status: 500,
            payload: json!({"success": false}),
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"kind": "upstream_error", "status": 500, "payload": {"success": false}})
        );
    }

    #[test]
    fn render_matches_display_rules() {
        assert_eq!(ClientPayload::Text("plain".into()).render(), "plain");
        assert_eq!(ClientPayload::Json(json!("bare")).render(), "bare");
        assert_eq!(
            ClientPayload::Json(json!({"a": 1})).render(),
            "<pre>{\n  \"a\": 1\n}</pre>"
        );
    }
}
