//! Edge image proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   GET /?url=…&w=…&h=…&q=…   (Accept: image/avif,…)
//!        │
//!        ▼
//!   ┌──────────┐   ┌────────────┐   ┌────────────┐   ┌───────────┐
//!   │negotiate │──▶│  source    │──▶│ dimensions │──▶│ cache key │
//!   └──────────┘   └────────────┘   └────────────┘   └─────┬─────┘
//!                                                          ▼
//!                                                   ┌─────────────┐  hit
//!                                                   │cache gateway│──────▶ stored response
//!                                                   └──────┬──────┘
//!                                                          ▼ miss
//!                                                   ┌─────────────┐
//!                                                   │ transformer │──▶ upstream service
//!                                                   └──────┬──────┘
//!                                                          ▼
//!                                                   ┌─────────────┐
//!                                                   │  assemble   │──▶ detached cache store
//!                                                   └──────┬──────┘
//!                                                          ▼
//!                                                       response
//! ```

use std::path::PathBuf;

use clap::Parser;

use image_edge_proxy::config::loader::load_config;
use image_edge_proxy::config::ProxyConfig;
use image_edge_proxy::lifecycle::startup;
use image_edge_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "image-edge-proxy")]
#[command(about = "Resizing image proxy with an edge response cache", long_about = None)]
struct Cli {
    /// TOML configuration file. Watched for pipeline setting changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("image-edge-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config, cli.config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
