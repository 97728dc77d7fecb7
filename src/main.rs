//! Usermon - Instrumented User Service
//!
//! A small REST service (login, register, list-users) with a Prometheus
//! metrics exporter served on a separate port.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usermon::{
    api::{ApiServer, AppState},
    config::ConfigManager,
    exporter::{MetricsExporter, MetricsServer, Sampler},
    ShutdownCoordinator, UserStore,
};

/// CLI arguments for usermon
#[derive(Parser, Debug)]
#[command(name = "usermon")]
#[command(about = "Usermon - Instrumented user service with a Prometheus exporter")]
#[command(version)]
#[command(long_about = "
Usermon - Instrumented user service

REST endpoints (login, register, list-users) on the API port, Prometheus
metrics on a dedicated exporter port.

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file
3. Environment variables
4. Built-in defaults

Environment variables:
  USERMON_BIND_ADDR        - API bind address (e.g., 127.0.0.1:8080)
  USERMON_METRICS_ADDR     - Metrics exporter bind address (e.g., 127.0.0.1:8081)
  USERMON_METRICS_ENABLED  - Enable the metrics exporter (true/false)
  USERMON_SHUTDOWN_TIMEOUT - Graceful shutdown timeout (e.g., 5s, 1m)
  USERMON_LOG_LEVEL        - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "config.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// API bind address (overrides config file)
    #[arg(short, long, help = "API bind address (e.g., 127.0.0.1:8080)")]
    pub bind: Option<String>,

    /// API port to bind to (overrides config file)
    #[arg(short, long, help = "API port to bind to")]
    pub port: Option<u16>,

    /// Metrics exporter bind address (overrides config file)
    #[arg(long, help = "Metrics exporter bind address (e.g., 127.0.0.1:8081)")]
    pub metrics_bind: Option<String>,

    /// Disable the metrics exporter endpoint
    #[arg(long, help = "Disable the metrics exporter endpoint")]
    pub no_metrics: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", help = "Log level")]
    pub log_level: String,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    init_tracing(&args)?;

    info!("Starting usermon v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with priority: CLI args > config file > environment > defaults
    let mut config = if args.config.exists() {
        ConfigManager::load_from_file(&args.config)?
    } else {
        info!("Config file not found, checking environment variables");
        ConfigManager::load_from_env()?
    };

    config.merge_with_cli_args(
        args.bind.as_deref(),
        args.port,
        args.metrics_bind.as_deref(),
        args.no_metrics,
    );

    config
        .validate()
        .context("Final configuration validation failed")?;

    if args.validate_config {
        info!("Configuration is valid");
        info!("Configuration summary:");
        info!("  API bind address: {}", config.server.bind_addr);
        info!(
            "  Metrics exporter: {}",
            if config.monitoring.enabled {
                format!("enabled on {}", config.monitoring.bind_addr)
            } else {
                "disabled".to_string()
            }
        );
        info!("  Shutdown timeout: {:?}", config.server.shutdown_timeout);
        info!("  Seed users: {}", config.users.len());
        return Ok(());
    }

    let shutdown_coordinator = ShutdownCoordinator::new(config.server.shutdown_timeout);

    // The exporter is the single shared telemetry handle; a registration
    // collision here is a startup configuration error and aborts the process.
    let exporter =
        Arc::new(MetricsExporter::new().context("Failed to construct metrics exporter")?);

    let store = Arc::new(UserStore::new());
    store.load_from_config(&config.users);

    // Periodic system sampler, cancelled via the shutdown broadcast
    let sampler = Sampler::new(exporter.clone());
    let sampler_handle = tokio::spawn(sampler.run(shutdown_coordinator.subscribe()));

    // Metrics exporter endpoint on its own port
    let metrics_handle = if config.monitoring.enabled {
        let server = MetricsServer::new(exporter.clone(), config.monitoring.bind_addr);
        let shutdown_rx = shutdown_coordinator.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.start(shutdown_rx).await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        info!("Metrics exporter disabled");
        None
    };

    // Main API server
    let api_server = ApiServer::new(config.server.bind_addr, AppState { store, exporter });
    let shutdown_rx = shutdown_coordinator.subscribe();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api_server.start(shutdown_rx).await {
            error!("API server error: {}", e);
        }
    });

    info!("usermon started successfully");
    info!("Press Ctrl+C or send SIGTERM/SIGINT to shut down gracefully");

    shutdown_coordinator.listen_for_signals().await?;

    info!("Initiating graceful shutdown...");
    let timeout = shutdown_coordinator.timeout();

    if tokio::time::timeout(timeout, api_handle).await.is_err() {
        warn!("API server did not shut down within {:?}", timeout);
    }

    if let Some(handle) = metrics_handle {
        if tokio::time::timeout(timeout, handle).await.is_err() {
            warn!("Metrics server did not shut down within {:?}", timeout);
        }
    }

    if tokio::time::timeout(timeout, sampler_handle).await.is_err() {
        warn!("System sampler did not shut down within {:?}", timeout);
    }

    info!("Server shutdown complete");

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(args: &CliArgs) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}
