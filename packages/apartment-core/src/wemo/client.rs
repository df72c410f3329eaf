//! High-level WeMo client commands.
//!
//! Provides identity lookup (device description) and binary state control
//! for a single device endpoint, plus [`WemoClientImpl`], the concrete
//! implementation of the client traits.

use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;
use thiserror::Error;

use crate::error::SoapResult;
use crate::protocol_constants::SETUP_PATH;
use crate::wemo::services::BasicEventAction;
use crate::wemo::soap::{
    decode_get_state_response, encode_get_state, encode_set_state, send_soap_request,
};
use crate::wemo::traits::{WemoIdentity, WemoSwitch};
use crate::wemo::types::Device;
use crate::wemo::utils::build_device_url;

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur while reading a device's identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request for the device description failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Device answered with a non-success status.
    #[error("HTTP error {0} fetching device description")]
    HttpStatus(u16),

    /// Description did not contain `device/friendlyName`.
    #[error("device description from {0} has no friendlyName")]
    MissingFriendlyName(String),
}

/// Convenient Result alias for identity lookups.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Fetches `/setup.xml` from a device and builds its [`Device`] identity.
///
/// No retry at this layer.
///
/// # Arguments
/// * `client` - The HTTP client to use for the request
/// * `host` - `ip:port` of the device
/// * `timeout` - Per-request timeout
pub async fn fetch_identity(
    client: &Client,
    host: &str,
    timeout: Duration,
) -> IdentityResult<Device> {
    let url = build_device_url(host, SETUP_PATH);
    log::debug!("[WeMo] Fetching identity from {}", url);

    let response = client.get(&url).timeout(timeout).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(IdentityError::HttpStatus(status.as_u16()));
    }
    let body = response.text().await?;

    let friendly_name = parse_friendly_name(&body)
        .ok_or_else(|| IdentityError::MissingFriendlyName(host.to_string()))?;

    Ok(Device::new(host, friendly_name))
}

/// Extracts `friendlyName` from the `device` element of a description.
///
/// Elements named `friendlyName` outside a `device` element are ignored, as
/// are empty names.
fn parse_friendly_name(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut device_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"device" => device_depth += 1,
                b"friendlyName" if device_depth > 0 => {
                    let name = reader.read_text(e.name()).ok()?;
                    let name = html_escape::decode_html_entities(&name).trim().to_string();
                    return (!name.is_empty()).then_some(name);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"device" => {
                device_depth = device_depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::trace!("Error parsing device description: {:?}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Binary State
// ─────────────────────────────────────────────────────────────────────────────

/// Reads the relay state of a device.
///
/// # Arguments
/// * `client` - The HTTP client to use for the request
/// * `host` - `ip:port` of the device
///
/// # Returns
/// `true` if the switch is on, `false` if it is off
pub async fn get_binary_state(client: &Client, host: &str) -> SoapResult<bool> {
    let response = send_soap_request(
        client,
        host,
        BasicEventAction::GetBinaryState,
        encode_get_state(),
    )
    .await?;

    decode_get_state_response(response.as_bytes())
}

/// Switches the relay of a device on or off.
///
/// # Arguments
/// * `client` - The HTTP client to use for the request
/// * `host` - `ip:port` of the device
/// * `desired` - `true` to switch on, `false` to switch off
pub async fn set_binary_state(client: &Client, host: &str, desired: bool) -> SoapResult<()> {
    send_soap_request(
        client,
        host,
        BasicEventAction::SetBinaryState,
        encode_set_state(desired),
    )
    .await?;

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Trait Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Concrete WeMo client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct WemoClientImpl {
    client: Client,
    identity_timeout: Duration,
}

impl WemoClientImpl {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `identity_timeout` - Timeout applied to device description fetches
    pub fn new(client: Client, identity_timeout: Duration) -> Self {
        Self {
            client,
            identity_timeout,
        }
    }
}

#[async_trait]
impl WemoIdentity for WemoClientImpl {
    async fn fetch_identity(&self, host: &str) -> IdentityResult<Device> {
        fetch_identity(&self.client, host, self.identity_timeout).await
    }
}

#[async_trait]
impl WemoSwitch for WemoClientImpl {
    async fn get_binary_state(&self, host: &str) -> SoapResult<bool> {
        get_binary_state(&self.client, host).await
    }

    async fn set_binary_state(&self, host: &str, desired: bool) -> SoapResult<()> {
        set_binary_state(&self.client, host, desired).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wemo::test_fixtures::SETUP_XML_CABINET_LIGHTS;

    #[test]
    fn parse_friendly_name_from_setup_xml() {
        assert_eq!(
            parse_friendly_name(SETUP_XML_CABINET_LIGHTS).as_deref(),
            Some("Cabinet Lights")
        );
    }

    #[test]
    fn parse_friendly_name_requires_device_parent() {
        let xml = r#"<?xml version="1.0"?>
<root>
  <friendlyName>Orphan</friendlyName>
  <device>
    <deviceType>urn:Belkin:device:controllee:1</deviceType>
  </device>
</root>"#;
        assert_eq!(parse_friendly_name(xml), None);
    }

    #[test]
    fn parse_friendly_name_rejects_empty_name() {
        let xml = "<root><device><friendlyName>  </friendlyName></device></root>";
        assert_eq!(parse_friendly_name(xml), None);
    }

    #[test]
    fn parse_friendly_name_handles_garbage() {
        assert_eq!(parse_friendly_name("not xml at all"), None);
    }
}
