//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use apartment_core::{BackoffPolicy, DiscoveryConfig, SsdpConfig};
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind the HTTP server to.
    /// Override: `APARTMENT_BIND_PORT`
    pub bind_port: u16,

    /// Address to bind the HTTP server to.
    /// Override: `APARTMENT_BIND_ADDRESS`
    pub bind_address: String,

    /// Interval in seconds between discovery passes.
    /// Override: `APARTMENT_REFRESH_INTERVAL`
    pub refresh_interval: u64,

    /// Missed discovery passes tolerated before a device is dropped.
    /// Override: `APARTMENT_MISSING_THRESHOLD`
    pub missing_threshold: u32,

    /// Device hosts (`ip:port`) probed on every pass, even without SSDP.
    /// Override: `APARTMENT_STATIC_HOSTS` (comma-separated)
    pub static_hosts: Vec<String>,

    /// Enable SSDP discovery.
    pub ssdp_enabled: bool,

    /// SSDP timing.
    pub ssdp: SsdpConfig,

    /// Timeout for fetching a device description (milliseconds).
    pub identity_fetch_timeout_ms: u64,

    /// Backoff for device state calls.
    pub backoff: BackoffPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = apartment_core::Config::default();
        Self {
            bind_port: core.preferred_port,
            bind_address: core.bind_address,
            refresh_interval: core.refresh_interval_secs,
            missing_threshold: core.missing_threshold,
            static_hosts: core.discovery.static_hosts,
            ssdp_enabled: core.discovery.ssdp_enabled,
            ssdp: core.discovery.ssdp,
            identity_fetch_timeout_ms: core.discovery.identity_fetch_timeout_ms,
            backoff: core.backoff,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies overrides from an environment-like lookup.
    ///
    /// Unparsable values are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parse_into<T: std::str::FromStr>(key: &str, val: &str, target: &mut T) {
            match val.trim().parse() {
                Ok(parsed) => *target = parsed,
                Err(_) => log::warn!("Ignoring invalid {}={:?}", key, val),
            }
        }

        if let Some(val) = lookup("APARTMENT_BIND_PORT") {
            parse_into("APARTMENT_BIND_PORT", &val, &mut self.bind_port);
        }

        if let Some(val) = lookup("APARTMENT_BIND_ADDRESS") {
            self.bind_address = val.trim().to_string();
        }

        if let Some(val) = lookup("APARTMENT_REFRESH_INTERVAL") {
            parse_into(
                "APARTMENT_REFRESH_INTERVAL",
                &val,
                &mut self.refresh_interval,
            );
        }

        if let Some(val) = lookup("APARTMENT_MISSING_THRESHOLD") {
            parse_into(
                "APARTMENT_MISSING_THRESHOLD",
                &val,
                &mut self.missing_threshold,
            );
        }

        if let Some(val) = lookup("APARTMENT_STATIC_HOSTS") {
            self.static_hosts = val
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    /// Converts to apartment-core's Config type.
    pub fn to_core_config(&self) -> apartment_core::Config {
        apartment_core::Config {
            preferred_port: self.bind_port,
            bind_address: self.bind_address.clone(),
            refresh_interval_secs: self.refresh_interval,
            missing_threshold: self.missing_threshold,
            backoff: self.backoff.clone(),
            discovery: DiscoveryConfig {
                static_hosts: self.static_hosts.clone(),
                ssdp_enabled: self.ssdp_enabled,
                ssdp: self.ssdp.clone(),
                identity_fetch_timeout_ms: self.identity_fetch_timeout_ms,
                ..DiscoveryConfig::default()
            },
        }
    }
}
