//! Apartment Core - shared library for the Apartment switch service.
//!
//! This crate exposes Belkin WeMo on/off switches behind a uniform
//! list/get/update API. It discovers devices on the local network, tracks
//! their liveness across repeated scans, and reads or sets their relay state
//! through the vendor SOAP dialect with exponential backoff.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`wemo`]: WeMo protocol codec, client, retry wrapper and discovery
//! - [`registry`]: Authoritative in-memory set of known devices
//! - [`services`]: Background refresh loop
//! - [`state`]: Configuration
//! - [`api`]: HTTP handlers and server startup
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! The registry and discovery depend on traits rather than on the HTTP
//! client, so tests can substitute in-memory devices:
//!
//! - [`WemoIdentity`](wemo::WemoIdentity): Device description lookup
//! - [`WemoSwitch`](wemo::WemoSwitch): Binary state control
//! - [`WemoDiscovery`](wemo::WemoDiscovery): Network-wide discovery
//! - [`HostSearch`](wemo::HostSearch): Low-level search primitive (SSDP)

#![warn(clippy::all)]

pub mod api;
pub mod bootstrap;
pub mod error;
pub mod protocol_constants;
pub mod registry;
pub mod services;
pub mod state;
pub mod wemo;

// Re-export commonly used types at the crate root
pub use error::{
    ApartmentError, ApartmentResult, DiscoveryResult, ErrorCode, IdentityResult, RetryResult,
    SoapResult,
};
pub use registry::{normalize_name, DeviceRegistry, DeviceSummary, DeviceView, RefreshReport};
pub use services::RefreshMonitor;
pub use state::Config;

// Re-export WeMo types
pub use wemo::{
    BackoffPolicy, Device, DiscoveryConfig, SsdpConfig, WemoClientImpl, WemoDiscovery,
    WemoIdentity, WemoSwitch,
};

// Re-export bootstrap types
pub use bootstrap::{bootstrap_services, BootstrappedServices};

// Re-export API types
pub use api::{start_server, AppState, ServerError};
