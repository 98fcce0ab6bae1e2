use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cln_cockpit::notifications::InvoiceListener;
use cln_cockpit::rpc::{RpcClient, LONG_POLL_TIMEOUT};
use cln_cockpit::ui::{self, LogBuffer};
use cln_cockpit::{Cockpit, Config};

/// Terminal dashboard for operating a Core Lightning node.
#[derive(Parser, Debug)]
#[command(name = "cln-cockpit", version, about)]
struct Args {
    /// Path to the lightning-rpc socket (overrides the config file)
    #[arg(long)]
    rpc: Option<PathBuf>,

    /// Path to a configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = load_config(args.config.as_deref()).await?;
    if let Some(rpc) = args.rpc {
        config.rpc.socket_path = rpc;
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation failed: {e}");
        std::process::exit(1);
    }

    // All logging goes to the UI's activity pane; stdout belongs to the
    // alternate screen while the UI runs.
    let log = LogBuffer::new(config.ui.activity_log_lines);
    tracing_subscriber::fmt()
        .compact()
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_writer(log.clone())
        .with_ansi(false)
        .init();

    info!(
        "Starting cln-cockpit (rpc: {})",
        config.rpc.socket_path.display()
    );

    let cockpit = Arc::new(Cockpit::new(config));

    // waitanyinvoice holds its connection for the whole long-poll, so
    // the listener gets a dedicated client.
    let listener_client = Arc::new(RpcClient::new(
        cockpit.config.rpc.socket_path.clone(),
        LONG_POLL_TIMEOUT,
    ));
    let mut listener = InvoiceListener::new(listener_client);
    let paid_rx = listener.subscribe();
    listener.start();

    let result = ui::run(cockpit, log, paid_rx).await;

    listener.stop();
    result
}

/// Load configuration from an explicit path or the standard locations.
async fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    candidates.push(PathBuf::from("./cln-cockpit.toml"));
    candidates.push(PathBuf::from("/etc/cln-cockpit/cln-cockpit.toml"));
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("cln-cockpit/cln-cockpit.toml"));
    }

    for path in candidates {
        if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let config: Config = toml::from_str(&content)?;
            return Ok(config);
        }
    }

    Ok(Config::default())
}
