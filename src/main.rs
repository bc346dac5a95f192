//! epigate - Epidemiological Surveillance Ingestion Gateway
//!
//! Accepts batches of surveillance records from independent producers,
//! aggregates them per source category, and hands each complete set to the
//! external analysis pipeline exactly once.
//!
//! # Usage
//!
//! ```bash
//! # Run with ./gateway.toml or built-in defaults
//! cargo run --release
//!
//! # Point at a specific pipeline executable
//! cargo run --release -- --processor /opt/analysis/run
//! ```
//!
//! # Environment Variables
//!
//! - `EPIGATE_CONFIG`: Path to a gateway.toml (overrides the search path)
//! - `EPIGATE_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use epigate::api::{create_app, GatewayState};
use epigate::config::{self, GatewayConfig};
use epigate::dispatch::{artifacts, ProcessRunner};
use epigate::pipeline::{AppState, CycleCoordinator};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "epigate")]
#[command(about = "Epidemiological surveillance ingestion gateway")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default from config, "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to a gateway.toml config file
    #[arg(long)]
    config: Option<String>,

    /// Override the external pipeline executable
    #[arg(long)]
    processor: Option<String>,

    /// Override the interchange artifact directory
    #[arg(long)]
    artifact_dir: Option<String>,
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    let mut cfg = match &args.config {
        Some(path) => GatewayConfig::load_from_file(std::path::Path::new(path))
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => GatewayConfig::load(),
    };

    // CLI overrides take precedence over file and defaults.
    if let Some(addr) = args.addr {
        cfg.server.addr = addr;
    }
    if let Some(processor) = args.processor {
        cfg.pipeline.program = processor;
    }
    if let Some(dir) = args.artifact_dir {
        cfg.pipeline.artifact_dir = dir.into();
    }

    cfg.validate().context("Invalid gateway configuration")?;
    config::init(cfg);
    let cfg = config::get();

    info!("Starting epigate v{}", env!("CARGO_PKG_VERSION"));
    info!(
        pipeline = %cfg.pipeline.program,
        timeout_secs = cfg.pipeline.timeout_secs,
        "External pipeline configured"
    );

    // Artifact directory: create it, then sweep stale artifacts from a
    // previous run — nothing in it is meant to survive a restart.
    std::fs::create_dir_all(&cfg.pipeline.artifact_dir).with_context(|| {
        format!(
            "Failed to create artifact directory {}",
            cfg.pipeline.artifact_dir.display()
        )
    })?;
    match artifacts::clean_artifact_dir(&cfg.pipeline.artifact_dir) {
        Ok(0) => {}
        Ok(n) => info!(removed = n, "Swept stale artifacts from previous run"),
        Err(e) => warn!(error = %e, "Failed to sweep artifact directory"),
    }

    let app_state = Arc::new(RwLock::new(AppState::default()));

    let runner = ProcessRunner::new(
        cfg.pipeline.program.clone(),
        cfg.pipeline.args.clone(),
        cfg.pipeline.timeout(),
    );
    let coordinator = Arc::new(CycleCoordinator::new(
        Box::new(runner),
        cfg.pipeline.artifact_dir.clone(),
        Arc::clone(&app_state),
    ));

    let app = create_app(GatewayState {
        coordinator,
        app_state,
    });

    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", cfg.server.addr))?;

    info!("HTTP server listening on {}", cfg.server.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Graceful shutdown complete");
    Ok(())
}

/// Resolve on ctrl-c. An in-flight dispatch is allowed to finish; partial
/// cycle data is dropped with the process.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
    }
}
