//! HTTP API layer.
//!
//! This module contains thin handlers that delegate to the registry.
//! It provides the router construction and server startup functionality.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::bootstrap::BootstrappedServices;
use crate::registry::DeviceRegistry;
use crate::services::RefreshMonitor;
use crate::state::Config;

pub mod http;
pub mod response;

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to a TCP port or serve connections.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// Address the server tried to listen on.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state for the API layer.
///
/// This is a thin wrapper that holds references to services.
/// All business logic lives in the services themselves.
#[derive(Clone)]
pub struct AppState {
    /// Registry of discovered devices.
    pub registry: Arc<DeviceRegistry>,
    /// Background refresh loop (for manual triggers).
    pub refresh_monitor: Arc<RefreshMonitor>,
    /// Application configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates the API state from bootstrapped services.
    pub fn new(services: &BootstrappedServices, config: Config) -> Self {
        Self {
            registry: Arc::clone(&services.registry),
            refresh_monitor: Arc::clone(&services.refresh_monitor),
            config: Arc::new(config),
        }
    }
}

/// Starts the HTTP server on the configured address and port.
///
/// Returns only when the listener fails; callers stop it by dropping the
/// future.
pub async fn start_server(state: AppState) -> Result<(), ServerError> {
    let addr = format!(
        "{}:{}",
        state.config.bind_address, state.config.preferred_port
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let local_addr: SocketAddr = listener.local_addr()?;
    log::info!("[Server] Listening on http://{}", local_addr);

    let app = http::create_router(state);
    axum::serve(listener, app).await?;

    Ok(())
}
