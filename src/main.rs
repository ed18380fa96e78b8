//! API firewall server.
//!
//! ```text
//!     Client ──▶ access ──▶ rate limit ──▶ body size ──▶ inspection ──▶ upstream / demo routes
//!                  │            │              │              │
//!                  └────────────┴──────────────┴──────────────┴──▶ {"error": "Blocked: <reason>"}
//!                                                                   + audit record
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use api_firewall::config::{apply_env_overrides, load_config, FirewallConfig};
use api_firewall::http::HttpServer;
use api_firewall::lifecycle::{shutdown_signal, Shutdown};
use api_firewall::observability::{logging, metrics};
use api_firewall::signatures::{SignatureCatalog, CATALOG_VERSION};

#[derive(Parser)]
#[command(name = "api-firewall", version, about = "Inline API request-inspection firewall")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate configuration and signatures, then exit.
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FirewallConfig::default(),
    };
    apply_env_overrides(&mut config)?;

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-firewall starting");

    // A bad signature is fatal before any traffic is accepted.
    let catalog = SignatureCatalog::from_config(&config.signatures)?;
    tracing::info!(
        catalog_version = CATALOG_VERSION,
        signatures = ?catalog.summary(),
        rate_limit = config.rate_limit.requests_per_window,
        window_secs = config.rate_limit.window_secs,
        max_graphql_depth = config.inspection.max_graphql_depth,
        audit_path = %config.audit.path,
        "Configuration loaded"
    );

    if cli.check_config {
        println!("configuration OK");
        return Ok(());
    }

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
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
