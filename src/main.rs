use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use monitor_api::{app, config, is_development, seed, AppState};

#[derive(Debug, Parser)]
#[command(name = "monitor-api")]
#[command(about = "Resource management API for the monitoring platform")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "MONITOR_API_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// YAML file of resources to create or replace at boot
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and friends are picked up
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config().clone();
    tracing::info!("Starting monitor-api in {:?} mode", config.environment);
    if !is_development!() && !config.security.require_auth {
        tracing::warn!("authentication is disabled outside development");
    }

    let state = AppState::connect(config)
        .await
        .context("failed to open the store")?;

    if let Some(path) = &args.seed {
        seed::load_file(&state, path).await?;
    }

    // Allow tests or deployments to override port via env
    let port = args
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse().ok()))
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", args.bind, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.bind, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
