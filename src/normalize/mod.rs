//! Response normalization subsystem.
//!
//! # Data Flow
//! ```text
//! upstream call attempt
//!     → transport.rs (TransportOutcome: failure | response | neither)
//!     → normalizer.rs (pure precedence rules)
//!     → outcome.rs (NormalizedOutcome: success | upstream error |
//!                   unexpected error | protocol violation)
//!     → relay (HTTP response or client payload)
//! ```
//!
//! # Design Decisions
//! - One pure component shared by the proxy and client relays
//! - Failures are returned as data, never as `Err` or panics
//! - A transport outcome is consumed by value, so it cannot be normalized twice

pub mod normalizer;
pub mod outcome;
pub mod transport;

pub use normalizer::normalize;
pub use outcome::{ClientPayload, ErrorDetails, NormalizedOutcome, Payload};
pub use transport::{HttpResponse, NetworkFailure, RawError, TransportOutcome};
