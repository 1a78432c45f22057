//! Diagnostic fixture endpoints.
//!
//! Each route produces one upstream behavior the normalizer has to handle:
//! JSON error bodies, a response slower than the relay timeout, an unhandled
//! fault with an opaque body, and a redirect.

use std::any::Any;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::{json, Value};

use crate::http::server::AppState;

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "404 - Not Found",
        })),
    )
}

pub async fn server_error() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "message": "500 - Internal Server error",
        })),
    )
}

/// Answers only after the configured delay.
pub async fn slow(State(state): State<AppState>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(state.fixtures.timeout_delay_ms)).await;
    Json(json!({
        "success": true,
        "message": "10 Second Response",
    }))
}

/// Faults while handling; the panic layer turns it into an opaque 500.
pub async fn internal_error() -> Json<Value> {
    panic!("deliberate fault in /api-internal-error")
}

pub async fn redirect() -> Redirect {
    Redirect::to("/get")
}

/// Plain-text 500 for a panicked handler.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal Server Error: {}", detail),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn panic_response_is_plain_text_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Internal Server Error: boom");
    }

    #[tokio::test]
    async fn error_fixtures_carry_matching_status() {
        let (status, Json(body)) = not_found().await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "404 - Not Found");

        let (status, Json(body)) = server_error().await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }
}
