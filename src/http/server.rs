//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, compression, timeout, panics)
//! - Apply method override ahead of routing
//! - Serve static files for unclaimed paths
//! - Serve until the shutdown broadcast fires

use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Request},
    routing::{delete, get, post, put},
    Router, ServiceExt,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::Layer;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::{FixtureConfig, RelayConfig, UploadConfig};
use crate::http::middleware::method_override;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::{echo, fixtures, proxy_routes};
use crate::lifecycle::shutdown::signalled;
use crate::relay::{ProxyRelay, RelayError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: ProxyRelay,
    pub uploads: UploadConfig,
    pub fixtures: FixtureConfig,
}

/// HTTP server for the relay service.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let state = AppState {
            relay: ProxyRelay::new(&config.upstream)?,
            uploads: config.uploads.clone(),
            fixtures: config.fixtures.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/get", get(echo::get))
            .route("/post", post(echo::post))
            .route("/put", put(echo::put))
            .route("/delete", delete(echo::delete))
            .route(
                "/post-multipart",
                post(echo::post_multipart).layer(DefaultBodyLimit::max(config.uploads.max_body_bytes)),
            )
            .route("/api-proxy-get", get(proxy_routes::proxy_get))
            .route("/api-proxy-post", post(proxy_routes::proxy_post))
            .route("/api-proxy-get-error", get(proxy_routes::proxy_get_error))
            .route("/api-proxy-redirect", get(proxy_routes::proxy_redirect))
            .route("/api-404-error", get(fixtures::not_found))
            .route("/api-500-error", get(fixtures::server_error))
            .route("/api-timeout-error", get(fixtures::slow))
            .route("/api-internal-error", get(fixtures::internal_error))
            .route("/api-redirect", get(fixtures::redirect))
            .fallback_service(ServeDir::new(&config.static_files.dir))
            .with_state(state)
            .layer(CatchPanicLayer::custom(fixtures::panic_response))
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            timeout_ms = self.config.upstream.timeout_ms,
            "HTTP server starting"
        );

        let app = axum::middleware::from_fn(method_override).layer(self.router);

        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(signalled(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
