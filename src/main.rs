//! Demo webhook server.
//!
//! Serves the bundled example handlers (`/confirm`, `/hello`, `/trimmer`,
//! `/tell-a-joke`) with configuration from an optional TOML file and the
//! `PORT` environment variable.

mod demo;

use std::path::PathBuf;

use clap::Parser;

use cx_webhook::config::{apply_env_overrides, load_config, ServerConfig};
use cx_webhook::observability::{init_logging, init_metrics};
use cx_webhook::{Shutdown, WebhookServer};

#[derive(Parser)]
#[command(name = "cx-webhook")]
#[command(about = "Demo conversational-agent webhook server", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on every interface (overrides config and `PORT`).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    if let Some(port) = cli.port {
        config.listener.bind_address = format!("0.0.0.0:{}", port);
    }

    init_logging(&config.logging)?;
    tracing::info!("cx-webhook v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        shutdown_timeout_secs = config.shutdown.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    let mut server = WebhookServer::new(config).with_span(tracing::info_span!("server"));
    demo::register(&mut server, reqwest::Client::new());

    // Nothing cancels the parent here; OS signals stop the server.
    let parent = Shutdown::new();
    server.serve(parent.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
