//! WeMo device control and discovery.
//!
//! Layering, bottom-up:
//! - `soap`: envelope codec and control-endpoint transport
//! - `client`: identity lookup and binary state calls for one host
//! - `retry`: exponential backoff around state calls
//! - `discovery`: SSDP search plus identity fetch

pub mod client;
pub mod discovery;
pub mod retry;
pub mod services;
pub mod soap;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use client::{
    fetch_identity, get_binary_state, set_binary_state, IdentityError, IdentityResult,
    WemoClientImpl,
};
pub use discovery::ssdp::{SsdpConfig, SsdpSearch};
pub use discovery::{DiscoveryConfig, DiscoveryCoordinator, DiscoveryError, DiscoveryResult};
pub use retry::{with_backoff, BackoffPolicy, RetryError, RetryResult};
pub use services::BasicEventAction;
pub use soap::{
    decode_get_state_response, encode_get_state, encode_set_state, SoapError, SoapResult,
};
pub use traits::{HostSearch, WemoDiscovery, WemoIdentity, WemoSwitch};
pub use types::Device;
