//! Cookie parsing and emission.
//!
//! Incoming `Cookie` headers are parsed into a map for handlers; outgoing
//! cookies are appended as separate `Set-Cookie` headers with `Path=/`.

use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
};

/// Cookies sent with the request, by name. The first occurrence of a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies(BTreeMap<String, String>);

impl RequestCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = BTreeMap::new();
        for value in headers.get_all(COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for pair in value.split(';') {
                let Some((name, val)) = pair.split_once('=') else {
                    continue;
                };
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let val = val.trim();
                let val = val
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(val);
                cookies.entry(name.to_string()).or_insert_with(|| val.to_string());
            }
        }
        Self(cookies)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<S> FromRequestParts<S> for RequestCookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Append `name=value; Path=/` as its own Set-Cookie header.
pub fn set_cookie(headers: &mut HeaderMap, name: &str, value: &str) {
    match HeaderValue::from_str(&format!("{}={}; Path=/", name, value)) {
        Ok(header) => {
            headers.append(SET_COOKIE, header);
        }
        Err(e) => tracing::warn!(cookie = %name, error = %e, "Skipping unrepresentable cookie"),
    }
}
