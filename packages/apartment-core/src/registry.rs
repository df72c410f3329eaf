//! Authoritative in-memory set of known devices.
//!
//! The registry is populated by discovery passes and tracks liveness across
//! them: every pass re-observes present devices (resetting their miss count)
//! and ages the rest, evicting entries once their miss count would exceed
//! the configured threshold.
//!
//! The entry map sits behind a single mutex that is held only for map reads
//! and for the merge step of a refresh. Discovery and device I/O always run
//! outside the lock, so readers never observe a partially merged pass.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{ApartmentError, ApartmentResult, DiscoveryResult, ErrorCode};
use crate::wemo::retry::{with_backoff, BackoffPolicy};
use crate::wemo::services::BasicEventAction;
use crate::wemo::traits::{WemoDiscovery, WemoSwitch};
use crate::wemo::types::Device;

/// Default number of consecutive missed scans before eviction.
pub const DEFAULT_MISSING_THRESHOLD: u32 = 5;

/// Normalizes a friendly name into a registry key.
///
/// Used for every key construction and lookup, so names are matched
/// case-insensitively.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// A registered device and its liveness counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Most recently observed identity.
    pub device: Device,
    /// Consecutive scans the device was not seen in.
    pub miss_count: u32,
}

/// List projection of a device (no state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    /// Normalized registry key.
    pub name: String,
    /// Label reported by the device.
    pub friendly_name: String,
}

/// Point-in-time view of a device including its relay state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceView {
    /// Normalized registry key.
    pub name: String,
    /// Label reported by the device.
    pub friendly_name: String,
    /// `true` if the switch is on.
    pub state: bool,
}

impl DeviceView {
    fn new(device: &Device, state: bool) -> Self {
        Self {
            name: normalize_name(&device.friendly_name),
            friendly_name: device.friendly_name.clone(),
            state,
        }
    }
}

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Distinct devices seen by discovery in this pass.
    pub observed: usize,
    /// Keys that were not registered before this pass.
    pub added: usize,
    /// Keys removed because they were missing for too long.
    pub evicted: Vec<String>,
}

/// Registry of discovered devices, keyed by normalized friendly name.
pub struct DeviceRegistry {
    entries: Mutex<HashMap<String, RegistryEntry>>,
    discovery: Arc<dyn WemoDiscovery>,
    switch: Arc<dyn WemoSwitch>,
    policy: BackoffPolicy,
    missing_threshold: u32,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    ///
    /// # Arguments
    /// * `discovery` - Source of devices for every refresh
    /// * `switch` - Binary state control used for device views
    /// * `policy` - Backoff applied to every state call
    /// * `missing_threshold` - Missed scans tolerated before eviction
    pub fn new(
        discovery: Arc<dyn WemoDiscovery>,
        switch: Arc<dyn WemoSwitch>,
        policy: BackoffPolicy,
        missing_threshold: u32,
    ) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            discovery,
            switch,
            policy,
            missing_threshold,
        }
    }

    /// Runs one discovery pass and merges it into the registry.
    ///
    /// Observed devices are upserted with a miss count of 0; unobserved
    /// entries are aged and evicted once the count would exceed the
    /// threshold. If discovery fails the registry is left untouched.
    pub async fn refresh(&self) -> DiscoveryResult<RefreshReport> {
        let devices = self.discovery.discover_devices().await?;

        // Later duplicates win
        let observed: HashMap<String, Device> = devices
            .into_iter()
            .map(|d| (normalize_name(&d.friendly_name), d))
            .collect();

        let report = self.merge(observed);

        if report.added > 0 || !report.evicted.is_empty() {
            log::info!(
                "[Registry] Refresh: {} observed, {} added, {} evicted {:?}",
                report.observed,
                report.added,
                report.evicted.len(),
                report.evicted
            );
        } else {
            log::debug!(
                "[Registry] Refresh: {} observed, no changes",
                report.observed
            );
        }

        Ok(report)
    }

    /// Applies one pass of observations under the lock.
    fn merge(&self, observed: HashMap<String, Device>) -> RefreshReport {
        let threshold = self.missing_threshold;
        let mut evicted = Vec::new();
        let mut entries = self.entries.lock();

        entries.retain(|key, entry| {
            if observed.contains_key(key) {
                return true;
            }
            if entry.miss_count >= threshold {
                evicted.push(key.clone());
                return false;
            }
            entry.miss_count += 1;
            true
        });

        let observed_count = observed.len();
        let mut added = 0;
        for (key, device) in observed {
            let previous = entries.insert(
                key,
                RegistryEntry {
                    device,
                    miss_count: 0,
                },
            );
            if previous.is_none() {
                added += 1;
            }
        }

        evicted.sort();
        RefreshReport {
            observed: observed_count,
            added,
            evicted,
        }
    }

    /// Lists registered devices, sorted by friendly name. No device I/O.
    pub fn list(&self) -> Vec<DeviceSummary> {
        let mut devices: Vec<DeviceSummary> = self
            .entries
            .lock()
            .iter()
            .map(|(name, entry)| DeviceSummary {
                name: name.clone(),
                friendly_name: entry.device.friendly_name.clone(),
            })
            .collect();

        devices.sort_by(|a, b| {
            a.friendly_name
                .cmp(&b.friendly_name)
                .then_with(|| a.name.cmp(&b.name))
        });
        devices
    }

    /// Looks up a device by name (case-insensitive).
    pub fn lookup(&self, name: &str) -> ApartmentResult<Device> {
        self.entries
            .lock()
            .get(&normalize_name(name))
            .map(|entry| entry.device.clone())
            .ok_or_else(|| ApartmentError::DeviceNotFound(name.to_string()))
    }

    /// Returns the current miss count of a device, if registered.
    pub fn miss_count(&self, name: &str) -> Option<u32> {
        self.entries
            .lock()
            .get(&normalize_name(name))
            .map(|entry| entry.miss_count)
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if no devices are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Reads the current state of a device.
    pub async fn get_device_view(&self, name: &str) -> ApartmentResult<DeviceView> {
        let device = self.lookup(name)?;
        let state = self.read_state(&device).await?;
        Ok(DeviceView::new(&device, state))
    }

    /// Sets the state of a device and reports the state read back afterwards.
    pub async fn update_device_view(
        &self,
        name: &str,
        desired: bool,
    ) -> ApartmentResult<DeviceView> {
        let device = self.lookup(name)?;

        log::info!(
            "[Registry] Setting {} ({}) to {}",
            device.friendly_name,
            device.host,
            if desired { "on" } else { "off" }
        );

        let action = BasicEventAction::SetBinaryState;
        with_backoff(&self.policy, action.name(), || {
            self.switch.set_binary_state(&device.host, desired)
        })
        .await
        .map_err(|e| {
            log::warn!(
                "[Registry] {} failed for {} ({}): {}",
                action.name(),
                device.host,
                e.code(),
                e
            );
            ApartmentError::from(e)
        })?;

        let state = self.read_state(&device).await?;
        Ok(DeviceView::new(&device, state))
    }

    /// Flips the state of a device.
    pub async fn toggle_device_view(&self, name: &str) -> ApartmentResult<DeviceView> {
        let current = self.get_device_view(name).await?;
        self.update_device_view(name, !current.state).await
    }

    async fn read_state(&self, device: &Device) -> ApartmentResult<bool> {
        let action = BasicEventAction::GetBinaryState;
        with_backoff(&self.policy, action.name(), || {
            self.switch.get_binary_state(&device.host)
        })
        .await
        .map_err(|e| {
            log::warn!(
                "[Registry] {} failed for {} ({}): {}",
                action.name(),
                device.host,
                e.code(),
                e
            );
            ApartmentError::from(e)
        })
    }
}
