//! Response relay service.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                    RESPONSE RELAY                     │
//!                  │                                                       │
//!  Client Request  │  ┌──────────┐   ┌─────────┐   ┌──────────────────┐    │
//!  ────────────────┼─▶│  method  │──▶│  http   │──▶│ echo / fixtures  │    │
//!                  │  │ override │   │ router  │   └──────────────────┘    │
//!                  │  └──────────┘   └────┬────┘                           │
//!                  │                      │ /api-proxy-*                   │
//!                  │                      ▼                                │
//!                  │               ┌─────────────┐   ┌──────────┐          │
//!  Client Response │               │ ProxyRelay  │──▶│ upstream │──────────┼──▶ Upstream
//!  ◀───────────────┼───────────────│ + normalize │◀──│ (reqwest)│◀─────────┼─── (same origin
//!                  │               └─────────────┘   └──────────┘          │     by default)
//!                  │                                                       │
//!                  │  config · observability · lifecycle                   │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use response_relay::config::load_or_default;
use response_relay::observability::{logging, metrics};
use response_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "response-relay")]
#[command(about = "Diagnostic HTTP service with a normalizing proxy relay", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init_logging(&config.observability)?;

    tracing::info!("response-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        timeout_ms = config.upstream.timeout_ms,
        static_dir = %config.static_files.dir,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
