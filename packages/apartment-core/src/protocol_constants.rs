//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the WeMo firmware and the UPnP/SSDP
//! specifications. Changing them breaks compatibility with real hardware.

// ─────────────────────────────────────────────────────────────────────────────
// WeMo Device Endpoints
// ─────────────────────────────────────────────────────────────────────────────

/// Path of the device description document that carries `friendlyName`.
pub const SETUP_PATH: &str = "/setup.xml";

/// Control path of the `basicevent` service (binary state get/set).
pub const BASIC_EVENT_CONTROL_PATH: &str = "/upnp/control/basicevent1";

/// Service URN of the `basicevent` service, used in envelopes and SOAPACTION.
pub const BASIC_EVENT_URN: &str = "urn:Belkin:service:basicevent:1";

/// Device types searched for during discovery (Insight and plain switches).
pub const WEMO_DEVICE_TYPES: &[&str] = &[
    "urn:Belkin:device:insight:1",
    "urn:Belkin:device:controllee:1",
];

// ─────────────────────────────────────────────────────────────────────────────
// HTTP/SOAP
// ─────────────────────────────────────────────────────────────────────────────

/// Timeout for SOAP HTTP requests (seconds).
///
/// 10 seconds is reasonable for LAN operations.
pub const SOAP_TIMEOUT_SECS: u64 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// SSDP
// ─────────────────────────────────────────────────────────────────────────────

/// Standard SSDP multicast address and port.
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Multicast TTL recommended by UPnP 1.0 for SSDP.
pub const SSDP_MULTICAST_TTL: u32 = 4;

// ─────────────────────────────────────────────────────────────────────────────
// Application Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Service identifier reported by the health endpoint.
pub const SERVICE_ID: &str = "apartment";
