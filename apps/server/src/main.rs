//! Apartment Server - Standalone headless server for Apartment.
//!
//! Discovers WeMo switches on the local network and serves the
//! list/get/update HTTP API until it receives Ctrl+C or SIGTERM.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use apartment_core::{bootstrap_services, start_server, AppState};
use clap::Parser;
use tokio::signal;

use crate::config::ServerConfig;

/// Apartment Server - WeMo switch discovery and control API.
#[derive(Parser, Debug)]
#[command(name = "apartment-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE", env = "APARTMENT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "APARTMENT_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Bind address (overrides config file).
    #[arg(short = 'b', long)]
    bind_address: Option<String>,

    /// Seconds between discovery passes (overrides config file).
    #[arg(short = 'r', long)]
    refresh_interval: Option<u64>,

    /// Device host to probe in addition to SSDP results; repeatable.
    #[arg(long = "host", value_name = "IP:PORT")]
    hosts: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Apartment Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if let Some(addr) = args.bind_address {
        config.bind_address = addr;
    }
    if let Some(interval) = args.refresh_interval {
        config.refresh_interval = interval;
    }
    if !args.hosts.is_empty() {
        config.static_hosts.extend(args.hosts);
    }

    log::info!(
        "Configuration: bind={}:{}, refresh_interval={}s, missing_threshold={}, static_hosts={:?}, ssdp={}",
        config.bind_address,
        config.bind_port,
        config.refresh_interval,
        config.missing_threshold,
        config.static_hosts,
        config.ssdp_enabled
    );

    let core_config = config.to_core_config();
    let services = bootstrap_services(&core_config).context("Failed to bootstrap services")?;

    log::info!("Services bootstrapped successfully");

    // Populate the registry before serving so the first requests see devices
    if let Err(e) = services.initial_refresh().await {
        log::warn!(
            "Starting with an empty registry ({}); periodic refresh will retry",
            e.code()
        );
    }

    let monitor_handle = services.start_background_tasks();

    log::info!("Background tasks started");

    let app_state = AppState::new(&services, core_config);

    tokio::select! {
        result = start_server(app_state) => {
            result.context("HTTP server failed")?;
        }
        _ = shutdown_signal() => {
            log::info!("Shutdown signal received, cleaning up...");
        }
    }

    // Graceful shutdown
    services.shutdown();
    if let Err(e) = monitor_handle.await {
        log::warn!("Refresh monitor ended abnormally: {}", e);
    }

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
