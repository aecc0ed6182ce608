//! RKSOK server daemon
//!
//! Loads configuration, wires up the store and the approval client, and
//! serves until interrupted.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rksok_rs::{Config, Server};

#[derive(Parser, Debug)]
#[command(name = "rksokd", about = "РКСОК/1.0 phone directory server")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the config file
    #[arg(long)]
    listen: Option<String>,

    /// Gatekeeper address, overriding the config file
    #[arg(long)]
    gatekeeper: Option<String>,

    /// Directory store file, overriding the config file
    #[arg(long)]
    store: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path).context("loading configuration")?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(gatekeeper) = args.gatekeeper {
        config.gatekeeper_addr = gatekeeper;
    }
    if let Some(store) = args.store {
        config.store_path = store;
    }

    let server = Server::builder().with_config(config).build();

    tokio::select! {
        result = server.run() => result.context("server failed")?,
        _ = tokio::signal::ctrl_c() => info!("interrupted, shutting down"),
    }
    Ok(())
}
