//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where all
//! services are instantiated and wired together.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinHandle;

use crate::error::{ApartmentError, ApartmentResult, ErrorCode};
use crate::protocol_constants::SOAP_TIMEOUT_SECS;
use crate::registry::{DeviceRegistry, RefreshReport};
use crate::services::RefreshMonitor;
use crate::state::Config;
use crate::wemo::discovery::ssdp::SsdpSearch;
use crate::wemo::discovery::DiscoveryCoordinator;
use crate::wemo::traits::{HostSearch, WemoDiscovery, WemoIdentity, WemoSwitch};
use crate::wemo::WemoClientImpl;

/// Container for all bootstrapped services.
#[derive(Clone)]
pub struct BootstrappedServices {
    /// Registry of discovered devices.
    pub registry: Arc<DeviceRegistry>,
    /// Background rescan loop.
    pub refresh_monitor: Arc<RefreshMonitor>,
}

impl BootstrappedServices {
    /// Populates the registry with a first discovery pass.
    ///
    /// On failure the registry stays empty and the periodic refresh will
    /// retry; callers decide whether that is fatal.
    pub async fn initial_refresh(&self) -> ApartmentResult<RefreshReport> {
        let report = self.registry.refresh().await.map_err(|e| {
            log::warn!("[Bootstrap] Initial discovery failed ({}): {}", e.code(), e);
            ApartmentError::from(e)
        })?;

        log::info!(
            "[Bootstrap] Initial discovery registered {} device(s)",
            report.added
        );
        Ok(report)
    }

    /// Starts background tasks (periodic refresh).
    pub fn start_background_tasks(&self) -> JoinHandle<()> {
        Arc::clone(&self.refresh_monitor).start()
    }

    /// Initiates graceful shutdown of all services.
    pub fn shutdown(&self) {
        log::info!("[Bootstrap] Beginning graceful shutdown...");
        self.refresh_monitor.shutdown();
    }
}

/// Creates the shared HTTP client used for all device requests.
fn create_http_client() -> ApartmentResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(SOAP_TIMEOUT_SECS))
        .build()
        .map_err(|e| ApartmentError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Bootstraps all application services with their dependencies.
///
/// Services are created in dependency order:
///
/// 1. Shared HTTP client
/// 2. WeMo client (identity + binary state)
/// 3. Discovery coordinator over SSDP search
/// 4. Device registry
/// 5. Refresh monitor
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the HTTP client
/// cannot be created.
pub fn bootstrap_services(config: &Config) -> ApartmentResult<BootstrappedServices> {
    config.validate().map_err(ApartmentError::Configuration)?;

    let http_client = create_http_client()?;

    // The concrete client implements both identity and switch traits
    let wemo = Arc::new(WemoClientImpl::new(
        http_client,
        config.discovery.identity_fetch_timeout(),
    ));

    let search: Arc<dyn HostSearch> = Arc::new(SsdpSearch::new(config.discovery.ssdp.clone()));
    let discovery: Arc<dyn WemoDiscovery> = Arc::new(DiscoveryCoordinator::new(
        config.discovery.clone(),
        search,
        Arc::clone(&wemo) as Arc<dyn WemoIdentity>,
    ));

    let registry = Arc::new(DeviceRegistry::new(
        discovery,
        wemo as Arc<dyn WemoSwitch>,
        config.backoff.clone(),
        config.missing_threshold,
    ));

    let refresh_monitor = Arc::new(RefreshMonitor::new(
        Arc::clone(&registry),
        Duration::from_secs(config.refresh_interval_secs),
    ));

    Ok(BootstrappedServices {
        registry,
        refresh_monitor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wemo::retry::BackoffPolicy;
    use crate::wemo::test_fixtures::{FakeDiscovery, FakeSwitch};
    use crate::wemo::types::Device;

    #[test]
    fn http_client_builds() {
        let client = create_http_client().unwrap();
        let request = client.get("http://192.168.1.187:49153/setup.xml").build();
        assert!(request.is_ok());
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let config = Config {
            refresh_interval_secs: 0,
            ..Config::default()
        };
        assert!(matches!(
            bootstrap_services(&config),
            Err(ApartmentError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn failed_initial_refresh_is_a_discovery_error() {
        let discovery = Arc::new(FakeDiscovery::new(Vec::new()));
        discovery.set_failing(true);
        let registry = Arc::new(DeviceRegistry::new(
            discovery,
            Arc::new(FakeSwitch::default()),
            BackoffPolicy::default(),
            5,
        ));
        let services = BootstrappedServices {
            refresh_monitor: Arc::new(RefreshMonitor::new(
                Arc::clone(&registry),
                Duration::from_secs(60),
            )),
            registry,
        };

        let err = services.initial_refresh().await.unwrap_err();
        assert!(matches!(err, ApartmentError::Discovery(_)));
        assert_eq!(err.code(), "discovery_failed");
        assert!(services.registry.is_empty());
    }

    #[tokio::test]
    async fn initial_refresh_reports_added_devices() {
        let discovery = Arc::new(FakeDiscovery::new(vec![Device::new(
            "192.168.1.187:49153",
            "Cabinet Lights",
        )]));
        let registry = Arc::new(DeviceRegistry::new(
            discovery,
            Arc::new(FakeSwitch::default()),
            BackoffPolicy::default(),
            5,
        ));
        let services = BootstrappedServices {
            refresh_monitor: Arc::new(RefreshMonitor::new(
                Arc::clone(&registry),
                Duration::from_secs(60),
            )),
            registry,
        };

        let report = services.initial_refresh().await.unwrap();
        assert_eq!(report.added, 1);
    }

    #[tokio::test]
    async fn wires_an_empty_registry() {
        let services = bootstrap_services(&Config::default()).unwrap();
        assert!(services.registry.is_empty());
    }
}
