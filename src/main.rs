//! Restaurant Gatekeeper
//!
//! Front door for the restaurant management API.
//!
//! # Request Pipeline
//!
//! ```text
//!     Client ──▶ rate limit ──▶ sanitize ──▶ validate ──▶ authenticate ──▶ authorize ──▶ handler
//!                  │ 429          (clean)       │ 400          │ 401             │ 403
//!                  ▼                            ▼              ▼                 ▼
//!               rejected                     rejected       rejected          rejected
//! ```
//!
//! Each stage either passes the request on or ends it with a JSON error
//! body. Later stages never run for a rejected request.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use restaurant_gatekeeper::lifecycle::{self, Shutdown};
use restaurant_gatekeeper::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "restaurant-gatekeeper")]
#[command(about = "Rate limiting, validation and role-based access for the restaurant API", long_about = None)]
struct Cli {
    /// Path to the TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging depends on the config, so config errors go to stderr.
    let config = match lifecycle::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    let mode = match lifecycle::effective_mode(&config) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Invalid deployment mode: {e}");
            std::process::exit(1);
        }
    };

    logging::init(&config.observability.log_level, mode);
    tracing::info!("restaurant-gatekeeper v{} starting", env!("CARGO_PKG_VERSION"));

    let prepared = match lifecycle::prepare(config) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::error!(error = %e, "Startup aborted");
            std::process::exit(1);
        }
    };

    if prepared.config.observability.metrics_enabled {
        if let Ok(addr) = prepared.config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %prepared.config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&prepared.config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(lifecycle::wait_for_signal(shutdown.clone()));

    prepared.server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
