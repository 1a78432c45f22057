//! Response relay library.
//!
//! Normalizes upstream HTTP outcomes into one deterministic result and
//! relays it from a server-side proxy or a caller-side client.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod normalize;
pub mod observability;
pub mod relay;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use normalize::{normalize, NormalizedOutcome, TransportOutcome};
pub use relay::{ClientRelay, ProxyRelay};
