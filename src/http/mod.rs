//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → middleware/method_override.rs (rewrite method before routing)
//!     → server.rs (Axum router, layers: request ID, trace, timeout, gzip, panics)
//!     → request.rs / cookies.rs / form.rs (request ID, cookies, body + query)
//!     → echo.rs | fixtures.rs | proxy_routes.rs (→ relay::ProxyRelay)
//!     → static files for anything else
//! ```

pub mod cookies;
pub mod echo;
pub mod fixtures;
pub mod form;
pub mod middleware;
pub mod proxy_routes;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
