//! Catalogue service entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use catalogue::config::{env, profiles_conflict, Config};
use catalogue::{logging, store::MongoConnector, Service};
use clap::Parser;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "catalogue")]
#[command(about = "Product catalogue lookup service")]
#[command(version)]
struct Cli {
    /// Optional TOML configuration file; environment variables take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Resolve configuration before anything else so a missing connection
    // profile stops the process before the listener is bound.
    let config = Config::load(cli.config.as_deref());
    let logging_config = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    logging::init_tracing(&logging_config, cli.verbose)?;

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e).context("Configuration error");
        }
    };

    if profiles_conflict(|name| std::env::var(name).ok()) {
        warn!(
            "Both {} and {} are set; using the {} profile",
            env::MONGO,
            env::DOCUMENTDB,
            config.store.mode
        );
    }

    info!(
        mode = %config.store.mode,
        port = config.http.port,
        "Configuration loaded"
    );

    let service = Service::start(config, Arc::new(MongoConnector)).await?;
    service.run().await
}
