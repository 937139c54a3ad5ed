//! HTTP front end for netconnector.

mod api;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;
use netconnector::VendorFactory;
use netconnector::remote::RemoteFactory;

use crate::api::AppState;
use crate::config::ServerConfig;

#[derive(Debug, Parser)]
#[command(name = "netconnector", version, about = "Network device connector service")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file and NETCONNECTOR_LISTEN
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref(), args.listen.as_deref())
        .context("loading configuration")?;

    let factory = VendorFactory::builtin().context("loading vendor platforms")?;
    let remote = Arc::new(RemoteFactory::new(Arc::new(factory), config.remote));
    let sweeper = remote.pools().spawn_sweeper();

    let app = api::router(AppState {
        remote: remote.clone(),
        token: Arc::new(config.token),
    });

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    info!("listening on {}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("shutting down, closing device sessions");
    sweeper.abort();
    remote.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
