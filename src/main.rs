//! Demo server for the Attendance Engine.
//!
//! Loads `attendance.yaml` and optional seed data into the in-memory store
//! and serves the HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use attendance_engine::api::{AppState, create_router};
use attendance_engine::config::ConfigLoader;
use attendance_engine::store::InMemoryStore;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the attendance server.
#[derive(Debug, Parser)]
#[command(name = "attendance-server", version, about)]
struct Cli {
    /// Directory containing attendance.yaml
    #[arg(short, long, default_value = "./config")]
    config: PathBuf,

    /// Seed data for the in-memory store
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Address to bind, overriding server.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let loader = ConfigLoader::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let store = match &cli.seed {
        Some(path) => {
            let seed = ConfigLoader::load_seed(path)
                .with_context(|| format!("loading seed data from {}", path.display()))?;
            info!(
                agents = seed.agents.len(),
                enrollments = seed.enrollments.len(),
                schedule_entries = seed.schedule.len(),
                "Seed data loaded"
            );
            InMemoryStore::from_seed(seed)?
        }
        None => InMemoryStore::new(),
    };

    let bind_address = cli
        .bind
        .clone()
        .unwrap_or_else(|| loader.config().server.bind_address.clone());

    let state = AppState::new(loader, Arc::new(store));
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {}", bind_address))?;
    info!(address = %bind_address, "Attendance server listening");

    axum::serve(listener, router).await?;
    Ok(())
}
