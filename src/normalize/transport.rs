//! Raw transport outcomes.
//!
//! A `TransportOutcome` is what the HTTP client hands back for one call
//! attempt, before any interpretation of status codes or bodies.

use std::error::Error as StdError;

/// The raw result of one upstream call attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOutcome {
    /// The call failed below HTTP (timeout, DNS, connection reset).
    NetworkFailure(NetworkFailure),
    /// An HTTP response arrived, whatever its status.
    HttpResponse(HttpResponse),
    /// The transport reported neither a failure nor a response.
    Neither,
}

impl TransportOutcome {
    /// Build an outcome from the two optional halves a callback-style
    /// transport reports. A failure takes precedence over a response.
    pub fn from_parts(failure: Option<NetworkFailure>, response: Option<HttpResponse>) -> Self {
        match (failure, response) {
            (Some(failure), _) => Self::NetworkFailure(failure),
            (None, Some(response)) => Self::HttpResponse(response),
            (None, None) => Self::Neither,
        }
    }
}

/// A transport-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFailure {
    pub name: String,
    pub message: String,
    pub stack_frames: Vec<String>,
}

impl NetworkFailure {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let stack_frames = vec![format!("{}: {}", name, message)];
        Self {
            name,
            message,
            stack_frames,
        }
    }

    /// Capture a failure from an error value.
    ///
    /// The first frame is `name: message`, followed by one frame per
    /// `source()` in the error chain.
    pub fn from_error(name: impl Into<String>, message: impl Into<String>, error: &dyn StdError) -> Self {
        let mut failure = Self::new(name, message);
        failure.stack_frames.extend(source_frames(error));
        failure
    }
}

/// An HTTP response as seen by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body_text: String,
    /// Error object the transport attaches to 4xx/5xx responses.
    pub raw_error: Option<RawError>,
}

impl HttpResponse {
    pub fn new(status: u16, body_text: impl Into<String>) -> Self {
        Self {
            status,
            body_text: body_text.into(),
            raw_error: None,
        }
    }

    pub fn with_raw_error(mut self, raw_error: RawError) -> Self {
        self.raw_error = Some(raw_error);
        self
    }
}

/// Error object attached to an error-status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawError {
    pub name: String,
    pub message: String,
    /// Newline-separated trace, first line `name: message`.
    pub stack: String,
}

impl RawError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let stack = format!("{}: {}", name, message);
        Self { name, message, stack }
    }

    pub fn from_error(name: impl Into<String>, message: impl Into<String>, error: &dyn StdError) -> Self {
        let mut raw = Self::new(name, message);
        for frame in source_frames(error) {
            raw.stack.push('\n');
            raw.stack.push_str(&frame);
        }
        raw
    }

    pub fn stack_frames(&self) -> Vec<String> {
        self.stack.split('\n').map(str::to_string).collect()
    }
}

fn source_frames(error: &dyn StdError) -> Vec<String> {
    let mut frames = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        frames.push(format!("    caused by: {}", cause));
        source = cause.source();
    }
    frames
}
