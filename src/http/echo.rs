//! Echo endpoints.
//!
//! Each handler answers with `{query, body, path}` so callers can see what
//! the server parsed. `/get` and `/post` optionally set cookies.

use std::path::PathBuf;

use axum::{
    extract::{Multipart, RawQuery, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::http::cookies::{set_cookie, RequestCookies};
use crate::http::form::{insert_form_value, is_truthy, query_to_json, FormBody};
use crate::http::server::AppState;

/// Query or body field that asks for cookies to be set.
pub const SET_COOKIES_FLAG: &str = "set-cookies";

#[derive(Debug, Serialize)]
pub struct Echo {
    pub query: Value,
    pub body: Value,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<UploadedFile>>,
}

impl Echo {
    fn new(uri: &Uri, query: Option<String>, body: Value) -> Self {
        Self {
            query: query_to_json(query.as_deref()),
            body,
            path: uri.path().to_string(),
            files: None,
        }
    }
}

/// Descriptor of a stored upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub fieldname: String,
    pub originalname: String,
    pub mimetype: String,
    pub destination: String,
    pub filename: String,
    pub path: String,
    pub size: u64,
}

fn log_cookies(cookies: &RequestCookies, path: &str) {
    if !cookies.is_empty() {
        tracing::trace!(path, cookies = ?cookies.names().collect::<Vec<_>>(), "Request cookies");
    }
}

pub async fn get(
    uri: Uri,
    RawQuery(query): RawQuery,
    cookies: RequestCookies,
    FormBody(body): FormBody,
) -> Response {
    log_cookies(&cookies, uri.path());
    let echo = Echo::new(&uri, query, body);
    let wants_cookie = is_truthy(echo.query.get(SET_COOKIES_FLAG));

    let mut response = Json(echo).into_response();
    if wants_cookie {
        set_cookie(response.headers_mut(), "cookie-set-from-get", "1");
    }
    response
}

pub async fn post(
    uri: Uri,
    RawQuery(query): RawQuery,
    cookies: RequestCookies,
    FormBody(body): FormBody,
) -> Response {
    log_cookies(&cookies, uri.path());
    let echo = Echo::new(&uri, query, body);
    let wants_cookies = is_truthy(echo.body.get(SET_COOKIES_FLAG));

    let mut response = Json(echo).into_response();
    if wants_cookies {
        set_cookie(response.headers_mut(), "cookie-set-from-post-1", "1");
        set_cookie(response.headers_mut(), "cookie-set-from-post-2", "1");
    }
    response
}

pub async fn put(uri: Uri, RawQuery(query): RawQuery, FormBody(body): FormBody) -> Json<Echo> {
    Json(Echo::new(&uri, query, body))
}

pub async fn delete(uri: Uri, RawQuery(query): RawQuery, FormBody(body): FormBody) -> Json<Echo> {
    Json(Echo::new(&uri, query, body))
}

/// Echo plus the stored files. Text fields land in `body`.
pub async fn post_multipart(
    State(state): State<AppState>,
    uri: Uri,
    RawQuery(query): RawQuery,
    mut multipart: Multipart,
) -> Result<Json<Echo>, (StatusCode, String)> {
    let destination = PathBuf::from(&state.uploads.dir);
    let mut fields = Map::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        let fieldname = field.name().unwrap_or_default().to_string();

        let Some(originalname) = field.file_name().map(str::to_string) else {
            let text = field.text().await.map_err(|e| (e.status(), e.body_text()))?;
            insert_form_value(&mut fields, fieldname, text);
            continue;
        };

        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|e| (e.status(), e.body_text()))?;

        let filename = Uuid::new_v4().simple().to_string();
        let path = destination.join(&filename);
        tokio::fs::write(&path, &data).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to store upload");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload".to_string())
        })?;

        tracing::debug!(field = %fieldname, size = data.len(), path = %path.display(), "Stored upload");

        files.push(UploadedFile {
            fieldname,
            originalname,
            mimetype,
            destination: destination.display().to_string(),
            filename,
            path: path.display().to_string(),
            size: data.len() as u64,
        });
    }

    let mut echo = Echo::new(&uri, query, Value::Object(fields));
    echo.files = Some(files);
    Ok(Json(echo))
}
