use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use roam::{
    config::{self, AppConfig},
    server, ConnectionManager, SchemeStore, SystemBackend,
};

#[derive(Parser)]
#[command(name = "roam")]
#[command(about = "Serve WiFi scanning and connection controls over HTTP")]
#[command(version)]
struct Cli {
    /// Application port
    #[arg(long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Application name shown on the index page
    #[arg(long, default_value = config::DEFAULT_NAME)]
    name: String,

    /// Access point interface, whose scan is listed
    #[arg(long, default_value = config::DEFAULT_AP)]
    ap: String,

    /// Adapter interface, used for the active network and connecting
    #[arg(long, default_value = config::DEFAULT_ADAPTER)]
    adapter: String,

    /// interfaces(5) file holding saved schemes
    #[arg(long, default_value = config::DEFAULT_INTERFACES_FILE)]
    interfaces: PathBuf,
}

impl From<Cli> for AppConfig {
    fn from(cli: Cli) -> Self {
        AppConfig {
            port: cli.port,
            name: cli.name,
            ap: cli.ap,
            adapter: cli.adapter,
            interfaces_file: cli.interfaces,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let config = Arc::new(AppConfig::from(Cli::parse()));

    let backend = SystemBackend::new(SchemeStore::new(&config.interfaces_file));
    let manager = ConnectionManager::new(Arc::new(backend));

    match manager.auto_connect(&config.adapter) {
        Some(scheme) => info!(scheme = %scheme.iface(), "auto-connected"),
        None => info!(adapter = %config.adapter, "auto-connect made no change"),
    }

    server::run_server(config.clone(), manager)
        .await
        .with_context(|| format!("Server on port {} stopped", config.port))
}
