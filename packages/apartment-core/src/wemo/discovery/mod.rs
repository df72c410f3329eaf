//! WeMo device discovery.
//!
//! # Discovery Pipeline
//!
//! 1. SSDP search for every configured device type
//! 2. Add configured static hosts and drop duplicates
//! 3. Fetch each host's identity concurrently, skipping hosts that fail

pub mod ssdp;
pub mod types;

pub use types::{DiscoveryError, DiscoveryResult};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use self::ssdp::SsdpConfig;
use crate::protocol_constants::WEMO_DEVICE_TYPES;
use crate::wemo::traits::{HostSearch, WemoDiscovery, WemoIdentity};
use crate::wemo::types::Device;

/// Configuration for the discovery coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Device type URNs to search for.
    pub device_types: Vec<String>,
    /// Hosts (`ip:port`) probed on every pass in addition to search results.
    pub static_hosts: Vec<String>,
    /// Enable SSDP search. When disabled only static hosts are probed.
    pub ssdp_enabled: bool,
    /// SSDP configuration.
    pub ssdp: SsdpConfig,
    /// Timeout for fetching a device description (milliseconds).
    pub identity_fetch_timeout_ms: u64,
    /// Maximum concurrent identity fetches.
    pub max_concurrent_fetches: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            device_types: WEMO_DEVICE_TYPES.iter().map(|t| t.to_string()).collect(),
            static_hosts: Vec::new(),
            ssdp_enabled: true,
            ssdp: SsdpConfig::default(),
            identity_fetch_timeout_ms: 3_000,
            max_concurrent_fetches: 8,
        }
    }
}

impl DiscoveryConfig {
    /// Timeout for fetching a device description.
    #[must_use]
    pub fn identity_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.identity_fetch_timeout_ms)
    }
}

/// Turns search results into [`Device`] identities.
pub struct DiscoveryCoordinator {
    config: DiscoveryConfig,
    search: Arc<dyn HostSearch>,
    identity: Arc<dyn WemoIdentity>,
}

impl DiscoveryCoordinator {
    /// Creates a new coordinator.
    ///
    /// # Arguments
    /// * `config` - Discovery configuration
    /// * `search` - Search primitive (SSDP in production)
    /// * `identity` - Identity lookup for each found host
    pub fn new(
        config: DiscoveryConfig,
        search: Arc<dyn HostSearch>,
        identity: Arc<dyn WemoIdentity>,
    ) -> Self {
        Self {
            config,
            search,
            identity,
        }
    }

    /// Collects candidate hosts from search and static configuration.
    ///
    /// Any search failure fails the whole pass.
    async fn collect_hosts(&self) -> DiscoveryResult<Vec<String>> {
        let mut hosts = Vec::new();

        if self.config.ssdp_enabled {
            for device_type in &self.config.device_types {
                let found = self.search.search(device_type).await?;
                log::debug!(
                    "[Discovery] {} host(s) answered for {}",
                    found.len(),
                    device_type
                );
                hosts.extend(found);
            }
        }

        hosts.extend(self.config.static_hosts.iter().cloned());

        let mut seen = HashSet::new();
        hosts.retain(|h| seen.insert(h.clone()));
        Ok(hosts)
    }
}

#[async_trait]
impl WemoDiscovery for DiscoveryCoordinator {
    async fn discover_devices(&self) -> DiscoveryResult<Vec<Device>> {
        let hosts = self.collect_hosts().await?;

        log::info!(
            "[Discovery] Fetching identity for {} host(s)...",
            hosts.len()
        );

        let identity = &self.identity;
        let devices: Vec<Device> = stream::iter(hosts)
            .map(|host| async move {
                match identity.fetch_identity(&host).await {
                    Ok(device) => Some(device),
                    Err(e) => {
                        log::warn!("[Discovery] Skipping {}: {}", host, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .filter_map(|d| async move { d })
            .collect()
            .await;

        log::info!("[Discovery] Discovered {} device(s)", devices.len());
        Ok(devices)
    }
}
