//! Request body and query parsing.
//!
//! # Responsibilities
//! - Decode `application/json` and `application/x-www-form-urlencoded` bodies
//! - Decode query strings with the same rules
//! - Decide whether a flag field is set
//!
//! # Design Decisions
//! - Keys are flat; a repeated key collects its values into an array
//! - Missing or unrecognized bodies decode to `{}`

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
};
use serde_json::{Map, Value};

/// Parsed request body as a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct FormBody(pub Value);

impl<S> FromRequest<S> for FormBody
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| (e.status(), e.body_text()))?;

        if bytes.is_empty() {
            return Ok(Self(Value::Object(Map::new())));
        }

        if content_type.starts_with("application/json") {
            serde_json::from_slice(&bytes)
                .map(Self)
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            Ok(Self(form_to_json(&bytes)))
        } else {
            Ok(Self(Value::Object(Map::new())))
        }
    }
}

/// Decode urlencoded pairs into a JSON object.
pub fn form_to_json(input: &[u8]) -> Value {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        insert_form_value(&mut map, key.into_owned(), value.into_owned());
    }
    Value::Object(map)
}

/// Decode an optional raw query string.
pub fn query_to_json(query: Option<&str>) -> Value {
    form_to_json(query.unwrap_or_default().as_bytes())
}

pub fn insert_form_value(map: &mut Map<String, Value>, key: String, value: String) {
    match map.get_mut(&key) {
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            map.insert(key, Value::String(value));
        }
    }
}

/// Loose truthiness for flag fields: absent, null, false, 0 and "" are unset.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
