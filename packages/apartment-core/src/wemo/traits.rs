//! Trait abstractions for WeMo operations.
//!
//! These traits enable dependency injection for testability and modularity.
//! The registry and discovery depend on traits rather than on the concrete
//! HTTP client, so tests can substitute in-memory devices.

use async_trait::async_trait;

use crate::error::{DiscoveryResult, IdentityResult, SoapResult};
use crate::wemo::types::Device;

/// Trait for reading a device's identity.
///
/// Used by discovery to turn a bare host into a [`Device`].
#[async_trait]
pub trait WemoIdentity: Send + Sync {
    /// Fetches the device description from `host` and returns its identity.
    ///
    /// Performs a single attempt; callers decide whether to retry.
    ///
    /// # Arguments
    /// * `host` - `ip:port` of the device
    async fn fetch_identity(&self, host: &str) -> IdentityResult<Device>;
}

/// Trait for binary (on/off) state control.
///
/// Used by the registry to serve device views. Implementations make exactly
/// one network round trip per call; retrying is the caller's job.
#[async_trait]
pub trait WemoSwitch: Send + Sync {
    /// Reads the current relay state.
    ///
    /// # Arguments
    /// * `host` - `ip:port` of the device
    async fn get_binary_state(&self, host: &str) -> SoapResult<bool>;

    /// Switches the relay on (`true`) or off (`false`).
    ///
    /// Setting the state the device is already in has no further effect.
    ///
    /// # Arguments
    /// * `host` - `ip:port` of the device
    /// * `desired` - Requested relay state
    async fn set_binary_state(&self, host: &str, desired: bool) -> SoapResult<()>;
}

/// Trait for network-wide device discovery.
///
/// Used by the registry for its initial population and every rescan.
#[async_trait]
pub trait WemoDiscovery: Send + Sync {
    /// Discovers devices on the local network.
    ///
    /// Order is unspecified and duplicates are possible.
    async fn discover_devices(&self) -> DiscoveryResult<Vec<Device>>;
}

/// Trait for the low-level search primitive behind discovery.
///
/// Implemented by SSDP; tests provide fixed host lists.
#[async_trait]
pub trait HostSearch: Send + Sync {
    /// Returns the `ip:port` hosts that answered a search for `device_type`.
    async fn search(&self, device_type: &str) -> DiscoveryResult<Vec<String>>;
}
