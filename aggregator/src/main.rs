//! GPU token throughput exporter
//!
//! Reads JSON-lines inference samples from stdin, aggregates them per GPU and
//! serves health, Prometheus and live per-GPU endpoints over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokenmeter_aggregator::{
    config::ExporterConfig, ingest, server::http, sink::PrometheusSink, AggregationEngine,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "tokenmeter-exporter")]
#[command(about = "Per-GPU token throughput, cost and energy exporter", long_about = None)]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "TOKENMETER_CONFIG")]
    config: Option<PathBuf>,

    /// Admin HTTP listen address (overrides configuration)
    #[arg(short, long, env = "TOKENMETER_ADMIN_LISTEN")]
    listen: Option<String>,

    /// Debug-level logging unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose, args.log_json);

    let mut config =
        ExporterConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(listen) = args.listen {
        config.admin_addr = listen;
    }

    let sink = Arc::new(PrometheusSink::new().context("Failed to register sink metrics")?);
    let engine = Arc::new(
        AggregationEngine::new(&config.engine, sink.clone()).context("Invalid engine configuration")?,
    );

    info!(
        history_capacity = config.engine.history_capacity,
        current_window_secs = config.engine.current_window_secs,
        trailing_window_secs = config.engine.trailing_window_secs,
        skus = config.engine.skus.len(),
        "Starting tokenmeter exporter on {}",
        config.admin_addr
    );

    let ingest_engine = engine.clone();
    tokio::spawn(async move {
        match ingest::sample_loop(tokio::io::stdin(), ingest_engine).await {
            Ok(stats) => info!(
                recorded = stats.recorded,
                rejected = stats.rejected,
                "Sample stream closed"
            ),
            Err(e) => error!("Sample stream read failed: {}", e),
        }
    });

    let addr = config
        .admin_addr
        .parse()
        .context("Invalid admin listen address")?;

    http::serve_admin(addr, engine, sink, shutdown_signal())
        .await
        .context("Admin HTTP server error")?;

    info!("Exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
