//! Domain types for WeMo devices.

use serde::Serialize;

/// A WeMo switch reachable at a fixed host.
///
/// Identity is read once from the device when the value is created; the
/// struct holds no state beyond that. Every state read goes to the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    /// `ip:port` of the device's UPnP HTTP server.
    pub host: String,
    /// Label reported by the device itself (e.g. "Cabinet Lights").
    #[serde(rename = "friendlyName")]
    pub friendly_name: String,
}

impl Device {
    /// Creates a device from already-known identity data.
    pub fn new(host: impl Into<String>, friendly_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            friendly_name: friendly_name.into(),
        }
    }
}
