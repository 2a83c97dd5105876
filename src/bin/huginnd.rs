//! huginnd: the Huginn daemon.
//!
//! Serves `GET /user/{id}` and `GET /invite/{code}` from the shared cache,
//! fetching from the upstream API on a miss.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use huginn::server::config::Config;
use huginn::{FetchPath, Huginn, HuginnError};

/// Huginn daemon: caching, rate-limited resource proxy.
#[derive(Parser)]
#[command(name = "huginnd")]
#[command(version)]
#[command(about = "Huginn caching resource proxy")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;

    let path = build_fetch_path(&config)?;

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| HuginnError::Configuration(format!("failed to bind {addr}: {e}")))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        %addr,
        upstream = %config.upstream.base_url,
        "huginnd starting"
    );

    huginn::server::serve(listener, Arc::new(path), shutdown_signal()).await?;

    Ok(())
}

/// Build a [`FetchPath`] from configuration.
fn build_fetch_path(config: &Config) -> Result<FetchPath, HuginnError> {
    Huginn::builder()
        .token(config.token()?)
        .base_url(&config.upstream.base_url)
        .auth_scheme(&config.upstream.auth_scheme)
        .fetch_timeout(config.fetch_timeout()?)
        .rate_limit(config.rate_limit.to_config()?)
        .build()
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
