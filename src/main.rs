//! ES module dev server proxy for browser test runs.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────┐
//!     Browser request     │                HOST SERVER               │
//!     ────────────────────┼─▶ esm middleware ──▶ routing rules       │
//!                         │        │                  │              │
//!                         │        │ forward          │ local        │
//!                         │        ▼                  ▼              │
//!                         │   forward.rs         /base files,        │
//!                         │        │             snapshots, bypass   │
//!                         └────────┼─────────────────────────────────┘
//!                                  ▼
//!                         ┌──────────────────┐
//!                         │  es-dev-server   │  (child process, started once)
//!                         └──────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use esm_proxy::config::{load_config, HostConfig};
use esm_proxy::observability::logging::init_logging;
use esm_proxy::{Emitter, EsmRouter, HostServer};

#[derive(Parser)]
#[command(name = "esm-proxy")]
#[command(about = "Serve test files through an ES module dev server", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HostConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!("esm-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        base_path = %config.base_path,
        bind_address = %config.listener.bind_address,
        watch = config.auto_watch,
        "Configuration loaded"
    );

    let emitter = Emitter::new();
    let esm = Arc::new(EsmRouter::with_process_launcher(config.clone(), emitter.clone())?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HostServer::new(&config, esm, emitter);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
