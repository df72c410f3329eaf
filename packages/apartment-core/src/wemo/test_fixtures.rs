//! Shared test fixtures for WeMo payloads.
//!
//! Payload constants and in-memory trait fakes shared by multiple test
//! modules.

/// Trimmed `/setup.xml` of a WeMo Switch named "Cabinet Lights".
pub const SETUP_XML_CABINET_LIGHTS: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:Belkin:device-1-0">
  <specVersion>
    <major>1</major>
    <minor>0</minor>
  </specVersion>
  <device>
    <deviceType>urn:Belkin:device:controllee:1</deviceType>
    <friendlyName>Cabinet Lights</friendlyName>
    <manufacturer>Belkin International Inc.</manufacturer>
    <modelName>Socket</modelName>
    <UDN>uuid:Socket-1_0-221517K0101769</UDN>
    <serviceList>
      <service>
        <serviceType>urn:Belkin:service:basicevent:1</serviceType>
        <serviceId>urn:Belkin:serviceId:basicevent1</serviceId>
        <controlURL>/upnp/control/basicevent1</controlURL>
      </service>
    </serviceList>
  </device>
</root>"#;

/// SSDP reply from a WeMo Switch.
pub const SSDP_REPLY_CONTROLLEE: &str = "HTTP/1.1 200 OK\r\n\
CACHE-CONTROL: max-age=86400\r\n\
EXT:\r\n\
LOCATION: http://192.168.1.187:49153/setup.xml\r\n\
SERVER: Unspecified, UPnP/1.0, Unspecified\r\n\
ST: urn:Belkin:device:controllee:1\r\n\
USN: uuid:Socket-1_0-221517K0101769::urn:Belkin:device:controllee:1\r\n\r\n";

// ─────────────────────────────────────────────────────────────────────────────
// In-memory Fakes
// ─────────────────────────────────────────────────────────────────────────────

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{DiscoveryResult, SoapResult};
use crate::wemo::discovery::DiscoveryError;
use crate::wemo::soap::SoapError;
use crate::wemo::traits::{WemoDiscovery, WemoSwitch};
use crate::wemo::types::Device;

/// Discovery returning a settable device list.
///
/// With a delay set, each pass sleeps that long before answering.
#[derive(Default)]
pub struct FakeDiscovery {
    devices: Mutex<Vec<Device>>,
    failing: AtomicBool,
    delay_ms: AtomicU64,
    calls: AtomicUsize,
}

impl FakeDiscovery {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: Mutex::new(devices),
            ..Self::default()
        }
    }

    pub fn set_devices(&self, devices: Vec<Device>) {
        *self.devices.lock() = devices;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WemoDiscovery for FakeDiscovery {
    async fn discover_devices(&self) -> DiscoveryResult<Vec<Device>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DiscoveryError::NoInterfaces);
        }
        Ok(self.devices.lock().clone())
    }
}

/// Switch keeping relay states in memory, keyed by host.
///
/// The next `failures` calls fail with a transient HTTP 500. With
/// `stuck_on` set, reads report `true` no matter what was written.
#[derive(Default)]
pub struct FakeSwitch {
    states: Mutex<HashMap<String, bool>>,
    failures: AtomicU32,
    stuck_on: AtomicBool,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl FakeSwitch {
    pub fn new(states: &[(&str, bool)]) -> Self {
        Self {
            states: Mutex::new(states.iter().map(|(h, s)| (h.to_string(), *s)).collect()),
            ..Self::default()
        }
    }

    pub fn fail_next(&self, failures: u32) {
        self.failures.store(failures, Ordering::SeqCst);
    }

    pub fn set_stuck_on(&self, stuck: bool) {
        self.stuck_on.store(stuck, Ordering::SeqCst);
    }

    pub fn state(&self, host: &str) -> Option<bool> {
        self.states.lock().get(host).copied()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> SoapResult<()> {
        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(SoapError::HttpStatus(500, "Internal Server Error".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl WemoSwitch for FakeSwitch {
    async fn get_binary_state(&self, host: &str) -> SoapResult<bool> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        if self.stuck_on.load(Ordering::SeqCst) {
            return Ok(true);
        }
        self.state(host)
            .ok_or_else(|| SoapError::Fault(format!("no device at {}", host)))
    }

    async fn set_binary_state(&self, host: &str, desired: bool) -> SoapResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        self.states.lock().insert(host.to_string(), desired);
        Ok(())
    }
}
