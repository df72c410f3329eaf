//! Low-level SOAP protocol implementation for the WeMo `basicevent` service.
//!
//! This module owns the envelope codec (get/set binary state), the HTTP
//! transport for control requests, and response decoding. For the
//! device-level operations built on top of it, see `client.rs`.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use super::services::BasicEventAction;
use super::utils::{build_device_url, extract_xml_text};
use crate::protocol_constants::{BASIC_EVENT_CONTROL_PATH, SOAP_TIMEOUT_SECS};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during SOAP operations with WeMo devices.
#[derive(Debug, Error)]
pub enum SoapError {
    /// HTTP request to the device failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Device returned a non-success HTTP status without a SOAP fault.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),

    /// Device returned a SOAP fault response.
    #[error("SOAP fault: {0}")]
    Fault(String),

    /// Device response could not be decoded into a binary state.
    #[error("failed to decode SOAP response: {0}")]
    Decode(String),
}

/// Convenient Result alias for SOAP operations.
pub type SoapResult<T> = Result<T, SoapError>;

impl SoapError {
    /// Returns true if the operation should be retried.
    ///
    /// Transport failures, error statuses and faults come from flaky firmware
    /// and usually clear up on a later attempt. A malformed response will
    /// not, so decode errors are permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, SoapError::Decode(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Envelope Codec
// ─────────────────────────────────────────────────────────────────────────────

// The firmware is picky about the envelope; these are sent byte-for-byte,
// including the leading newline and indentation.
const GET_BINARY_STATE_MSG: &str = r#"
<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body>
    <u:GetBinaryState xmlns:u="urn:Belkin:service:basicevent:1"></u:GetBinaryState>
  </s:Body>
</s:Envelope>
"#;

const SET_BINARY_STATE_HEAD: &str = r#"
<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body>
    <u:SetBinaryState xmlns:u="urn:Belkin:service:basicevent:1">
      <BinaryState>"#;

const SET_BINARY_STATE_TAIL: &str = r#"</BinaryState>
    </u:SetBinaryState>
  </s:Body>
</s:Envelope>
"#;

/// Builds the `GetBinaryState` request envelope.
#[must_use]
pub fn encode_get_state() -> Vec<u8> {
    GET_BINARY_STATE_MSG.as_bytes().to_vec()
}

/// Builds the `SetBinaryState` request envelope for the desired state.
#[must_use]
pub fn encode_set_state(desired: bool) -> Vec<u8> {
    let value = if desired { "1" } else { "0" };
    [SET_BINARY_STATE_HEAD, value, SET_BINARY_STATE_TAIL]
        .concat()
        .into_bytes()
}

/// Decodes a `GetBinaryState` response body into an on/off state.
///
/// Only `0` and `1` are accepted. Firmware may report richer codes (e.g. `8`
/// for an Insight in standby); those are rejected as decode errors rather
/// than guessed at.
pub fn decode_get_state_response(body: &[u8]) -> SoapResult<bool> {
    let text = String::from_utf8_lossy(body);
    let value = extract_xml_text(&text, "BinaryState")
        .ok_or_else(|| SoapError::Decode("missing BinaryState element".into()))?;

    match value.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(SoapError::Decode(format!(
            "unsupported BinaryState value {:?}",
            other
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SOAP Request/Response
// ─────────────────────────────────────────────────────────────────────────────

/// Sends a `basicevent` SOAP request to a WeMo device.
///
/// Posts `body` to the control endpoint with the action's SOAPACTION header
/// and returns the response text. A SOAP fault in the body takes precedence
/// over the HTTP status, since faults usually arrive with a 500.
///
/// # Arguments
/// * `client` - The HTTP client to use for the request
/// * `host` - `ip:port` of the device
/// * `action` - The `basicevent` action being invoked
/// * `body` - A pre-encoded envelope from [`encode_get_state`] or [`encode_set_state`]
pub async fn send_soap_request(
    client: &Client,
    host: &str,
    action: BasicEventAction,
    body: Vec<u8>,
) -> SoapResult<String> {
    let url = build_device_url(host, BASIC_EVENT_CONTROL_PATH);

    log::debug!(
        "[SOAP] {} -> {} (body: {} bytes)",
        action.name(),
        url,
        body.len()
    );

    let start = std::time::Instant::now();
    let res = client
        .post(&url)
        .header("Content-Type", "text/xml")
        .header("SOAPACTION", action.soap_action())
        .body(body)
        .timeout(Duration::from_secs(SOAP_TIMEOUT_SECS))
        .send()
        .await;

    log::debug!(
        "[SOAP] {} completed in {:?}: {:?}",
        action.name(),
        start.elapsed(),
        res.as_ref().map(|r| r.status())
    );

    let res = res?;
    let status = res.status();
    let response_text = res.text().await?;

    if response_text.contains("<s:Fault>") || response_text.contains("<soap:Fault>") {
        let fault_msg = extract_xml_text(&response_text, "faultstring")
            .unwrap_or_else(|| "Unknown SOAP fault".to_string());
        return Err(SoapError::Fault(fault_msg));
    }

    if !status.is_success() {
        return Err(SoapError::HttpStatus(status.as_u16(), response_text));
    }

    Ok(response_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_state_envelope_is_fixed() {
        let body = String::from_utf8(encode_get_state()).unwrap();
        assert!(body.starts_with("\n<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<s:Envelope"));
        assert!(body.contains(
            r#"<u:GetBinaryState xmlns:u="urn:Belkin:service:basicevent:1"></u:GetBinaryState>"#
        ));
        assert!(body.ends_with("</s:Envelope>\n"));
        assert_eq!(encode_get_state(), encode_get_state());
    }

    #[test]
    fn set_state_envelope_carries_single_digit() {
        let on = String::from_utf8(encode_set_state(true)).unwrap();
        let off = String::from_utf8(encode_set_state(false)).unwrap();

        assert!(on.contains("      <BinaryState>1</BinaryState>\n    </u:SetBinaryState>"));
        assert!(off.contains("      <BinaryState>0</BinaryState>\n    </u:SetBinaryState>"));
        assert!(on.contains(r#"<u:SetBinaryState xmlns:u="urn:Belkin:service:basicevent:1">"#));
        assert!(on.ends_with("</s:Envelope>\n"));
    }

    #[test]
    fn decode_reads_on_and_off() {
        let on = br#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:GetBinaryStateResponse xmlns:u="urn:Belkin:service:basicevent:1"><BinaryState>1</BinaryState></u:GetBinaryStateResponse></s:Body></s:Envelope>"#;
        let off = br#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:GetBinaryStateResponse xmlns:u="urn:Belkin:service:basicevent:1"><BinaryState>0</BinaryState></u:GetBinaryStateResponse></s:Body></s:Envelope>"#;

        assert!(decode_get_state_response(on).unwrap());
        assert!(!decode_get_state_response(off).unwrap());
    }

    #[test]
    fn decode_rejects_standby_code() {
        let body = b"<s:Envelope><s:Body><BinaryState>8</BinaryState></s:Body></s:Envelope>";
        let err = decode_get_state_response(body).unwrap_err();
        assert!(matches!(err, SoapError::Decode(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn decode_rejects_missing_tag() {
        let body = b"<s:Envelope><s:Body></s:Body></s:Envelope>";
        assert!(matches!(decode_get_state_response(body), Err(SoapError::Decode(_))));
    }

    #[test]
    fn transport_class_errors_are_transient() {
        assert!(SoapError::HttpStatus(500, String::new()).is_transient());
        assert!(SoapError::Fault("ActionFailed".into()).is_transient());
    }
}
