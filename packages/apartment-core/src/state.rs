//! Core configuration types.

use serde::{Deserialize, Serialize};

use crate::registry::DEFAULT_MISSING_THRESHOLD;
use crate::wemo::discovery::DiscoveryConfig;
use crate::wemo::retry::BackoffPolicy;

/// Configuration for the Apartment service.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    // Server
    /// Port for the HTTP API.
    pub preferred_port: u16,

    /// Address the HTTP API binds to.
    pub bind_address: String,

    // Registry
    /// Interval between discovery passes (seconds).
    pub refresh_interval_secs: u64,

    /// Consecutive missed passes tolerated before a device is evicted.
    pub missing_threshold: u32,

    /// Backoff for device state calls.
    pub backoff: BackoffPolicy,

    // Discovery
    /// Discovery configuration.
    pub discovery: DiscoveryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferred_port: 10000,
            bind_address: "0.0.0.0".to_string(),
            refresh_interval_secs: 60,
            missing_threshold: DEFAULT_MISSING_THRESHOLD,
            backoff: BackoffPolicy::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.refresh_interval_secs == 0 {
            return Err("refresh_interval_secs must be >= 1".to_string());
        }
        if self.bind_address.trim().is_empty() {
            return Err("bind_address must not be empty".to_string());
        }
        if self.discovery.max_concurrent_fetches == 0 {
            return Err("discovery.max_concurrent_fetches must be >= 1".to_string());
        }
        if self.discovery.ssdp_enabled && self.discovery.device_types.is_empty() {
            return Err("discovery.device_types must not be empty when SSDP is enabled".to_string());
        }
        if self.discovery.ssdp_enabled && self.discovery.ssdp.send_count == 0 {
            return Err("discovery.ssdp.send_count must be >= 1 when SSDP is enabled".to_string());
        }
        self.backoff.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.preferred_port, 10000);
        assert_eq!(config.missing_threshold, 5);
    }

    #[test]
    fn zero_threshold_is_allowed() {
        let config = Config {
            missing_threshold: 0,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = Config {
            refresh_interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_ssdp_send_count_is_rejected() {
        let mut config = Config::default();
        config.discovery.ssdp.send_count = 0;
        assert!(config.validate().unwrap_err().contains("send_count"));

        // Irrelevant when discovery relies on static hosts only
        config.discovery.ssdp_enabled = false;
        config.discovery.static_hosts = vec!["192.168.1.187:49153".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"missing_threshold": 2, "backoff": {"max_elapsed_ms": 1000}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.missing_threshold, 2);
        assert_eq!(config.backoff.max_elapsed_ms, 1000);
        assert_eq!(config.backoff.initial_interval_ms, 500);
        assert_eq!(config.refresh_interval_secs, 60);
    }
}
