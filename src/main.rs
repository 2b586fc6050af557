//! PLC gateway
//!
//! Relays request descriptions from PLC devices to the context broker.
//!
//! # Architecture Overview
//!
//! ```text
//!   Device POST                 ┌──────────────────────────────────────────────┐
//!   ───────────────────────────▶│ http server                                  │
//!                               │   → pipeline (decode → validate → build)     │
//!                               │   → transform (passthrough | counter)        │──▶ entity store
//!                               │   → dispatch                                 │──▶ Broker
//!   ◀───────────────────────────│   ← relay / error reply                      │
//!   Device response             └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use plc_gateway::config::{apply_env_overrides, load_config, validate_config, ConfigError};
use plc_gateway::lifecycle::{spawn_signal_handler, Shutdown};
use plc_gateway::observability::{logging, metrics};
use plc_gateway::{GatewayConfig, HttpServer};

#[derive(Parser)]
#[command(name = "plc-gateway")]
#[command(about = "HTTP gateway between PLC devices and the context broker", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "plc-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        broker = %config.broker.base_url,
        transform_enabled = config.transform.enabled,
        resolution = ?config.transform.resolution,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
