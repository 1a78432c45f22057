//! Relay subsystem: the two call sites of the normalizer.
//!
//! # Data Flow
//! ```text
//! ProxyRelay (server)                 ClientRelay (caller side)
//!     │                                   │
//!     └──────────► upstream.rs ◄──────────┘
//!                  (reqwest, timeout, redirects, one TransportOutcome)
//!                        │
//!                        ▼
//!                  normalize::normalize
//!                        │
//!          ┌─────────────┴─────────────┐
//!          ▼                           ▼
//!   proxy.rs: HTTP response     client.rs: ClientPayload via Completion
//!   (+ Set-Cookie forwarding)
//! ```
//!
//! # Design Decisions
//! - Timeout and base URL come from configuration, not constants
//! - Status codes never become transport failures
//! - One attempt per call, no retries

pub mod client;
pub mod proxy;
pub mod upstream;

use thiserror::Error;

pub use client::{ClientRelay, ClientRelayConfig, Completion};
pub use proxy::{ProxyRelay, RelayRequest};
pub use upstream::{UpstreamBody, UpstreamCall, UpstreamClient, UpstreamReply};

/// Errors raised while constructing a relay.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid upstream base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}
