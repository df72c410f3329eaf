//! SSDP-based WeMo host search.
//!
//! Sends M-SEARCH queries for one device type to 239.255.255.250:1900 on
//! every non-virtual interface and collects the `LOCATION` hosts of the
//! replies. The same socket is used for send AND receive since devices reply
//! unicast back to the sending socket/port.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use local_ip_address::list_afinet_netifas;
use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::types::{is_virtual_interface, DiscoveryError, DiscoveryResult};
use crate::protocol_constants::{SSDP_MULTICAST_ADDR, SSDP_MULTICAST_TTL};
use crate::wemo::traits::HostSearch;
use crate::wemo::utils::host_from_location;

// ─────────────────────────────────────────────────────────────────────────────
// ASCII Case-Insensitive Helpers
// ─────────────────────────────────────────────────────────────────────────────
//
// HTTP headers are ASCII, so byte-level comparison is safe and avoids
// allocating lowercase copies of every reply.

/// Checks if `haystack` contains `needle` (ASCII case-insensitive).
#[inline]
fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Checks if `s` starts with `prefix` (ASCII case-insensitive).
#[inline]
fn starts_with_ignore_ascii_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Returns the trimmed value of header `name` (given with trailing colon).
fn header_value<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    response
        .lines()
        .find(|l| starts_with_ignore_ascii_case(l, name))
        .map(|l| l[name.len()..].trim())
}

// ─────────────────────────────────────────────────────────────────────────────

/// Build the M-SEARCH message for one device type.
fn build_msearch_message(mx: u64, search_target: &str) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: 239.255.255.250:1900\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\r\n",
        mx, search_target
    )
}

/// Parses an SSDP reply and returns the device host (`ip:port`).
///
/// Returns None unless the reply's ST or USN names `device_type` and it
/// carries a usable LOCATION header.
fn parse_ssdp_response(response: &str, device_type: &str) -> Option<String> {
    let matches_type = ["st:", "nt:", "usn:"].iter().any(|h| {
        header_value(response, h).is_some_and(|v| contains_ignore_ascii_case(v, device_type))
    });
    if !matches_type {
        return None;
    }

    header_value(response, "location:").and_then(host_from_location)
}

/// Network interface information for discovery.
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    /// Interface name (e.g., "en0", "eth0").
    pub name: String,
    /// IPv4 address bound to this interface.
    pub ip: Ipv4Addr,
}

/// Gets all usable network interfaces for discovery.
///
/// Filters out virtual/container interfaces and loopback.
pub fn get_interfaces() -> Vec<InterfaceInfo> {
    list_afinet_netifas()
        .unwrap_or_else(|e| {
            log::warn!("Failed to list network interfaces: {}", e);
            Vec::new()
        })
        .into_iter()
        .filter_map(|(name, addr)| {
            if is_virtual_interface(&name) {
                log::debug!("Skipping virtual interface: {}", name);
                return None;
            }
            match addr {
                IpAddr::V4(ip) if !ip.is_loopback() => Some(InterfaceInfo { name, ip }),
                _ => None,
            }
        })
        .collect()
}

/// Creates a UDP socket bound to a specific interface for SSDP.
fn create_socket(iface_ip: Ipv4Addr) -> Result<UdpSocket, DiscoveryError> {
    let bind_addr = SocketAddr::new(IpAddr::V4(iface_ip), 0);

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(DiscoveryError::SocketBind)?;

    if let Err(e) = socket.set_reuse_address(true) {
        log::warn!("Failed to set SO_REUSEADDR on {}: {}", iface_ip, e);
    }

    if let Err(e) = socket.set_multicast_ttl_v4(SSDP_MULTICAST_TTL) {
        log::warn!("Failed to set multicast TTL on {}: {}", iface_ip, e);
    }

    socket
        .set_nonblocking(true)
        .map_err(DiscoveryError::SocketBind)?;
    socket
        .bind(&bind_addr.into())
        .map_err(DiscoveryError::SocketBind)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket).map_err(DiscoveryError::SocketBind)
}

/// Configuration for SSDP discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsdpConfig {
    /// Number of M-SEARCH packets to send per interface.
    pub send_count: u64,
    /// Delay between M-SEARCH retries (milliseconds).
    pub retry_delay_ms: u64,
    /// How long to collect replies (milliseconds).
    pub discovery_timeout_ms: u64,
    /// MX value (max response delay in seconds).
    pub mx_value: u64,
}

impl Default for SsdpConfig {
    fn default() -> Self {
        Self {
            send_count: 3,
            retry_delay_ms: 800,
            discovery_timeout_ms: 5_000,
            mx_value: 2,
        }
    }
}

/// [`HostSearch`] implementation over SSDP multicast.
#[derive(Debug, Clone, Default)]
pub struct SsdpSearch {
    config: SsdpConfig,
}

impl SsdpSearch {
    /// Creates a searcher with the given configuration.
    pub fn new(config: SsdpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl HostSearch for SsdpSearch {
    async fn search(&self, device_type: &str) -> DiscoveryResult<Vec<String>> {
        search_multicast(&self.config, device_type).await
    }
}

/// Runs one SSDP search for `device_type` on all usable interfaces.
pub async fn search_multicast(
    config: &SsdpConfig,
    device_type: &str,
) -> DiscoveryResult<Vec<String>> {
    let interfaces = get_interfaces();
    if interfaces.is_empty() {
        return Err(DiscoveryError::NoInterfaces);
    }

    let mut sockets: Vec<(InterfaceInfo, Arc<UdpSocket>)> = Vec::new();
    for iface in interfaces {
        match create_socket(iface.ip) {
            Ok(socket) => sockets.push((iface, Arc::new(socket))),
            Err(e) => log::warn!(
                "[SSDP] Failed to create socket for {} ({}): {}",
                iface.name,
                iface.ip,
                e
            ),
        }
    }
    if sockets.is_empty() {
        return Err(DiscoveryError::NoInterfaces);
    }

    log::debug!(
        "[SSDP] Searching for {} on {} interface(s)",
        device_type,
        sockets.len()
    );

    let msg = build_msearch_message(config.mx_value, device_type);
    let retry_delay = Duration::from_millis(config.retry_delay_ms);
    let discovery_timeout = Duration::from_millis(config.discovery_timeout_ms);
    let found: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    // Each send future reports whether at least one packet left the socket
    let send_futures: Vec<_> = sockets
        .iter()
        .map(|(iface, socket)| {
            let socket = Arc::clone(socket);
            let iface_name = iface.name.clone();
            let msg = msg.as_bytes().to_vec();
            let send_count = config.send_count;

            async move {
                let mut sent_any = false;
                for i in 0..send_count {
                    if i > 0 {
                        tokio::time::sleep(retry_delay).await;
                    }
                    match socket.send_to(&msg, SSDP_MULTICAST_ADDR).await {
                        Ok(_) => sent_any = true,
                        Err(e) => log::warn!(
                            "[SSDP] Failed to send M-SEARCH on {} (attempt {}): {}",
                            iface_name,
                            i + 1,
                            e
                        ),
                    }
                }
                sent_any
            }
        })
        .collect();

    let recv_futures: Vec<_> = sockets
        .iter()
        .map(|(iface, socket)| {
            let socket = Arc::clone(socket);
            let iface_name = iface.name.clone();
            let found = Arc::clone(&found);

            async move {
                let mut buf = [0u8; 2048];
                let start = std::time::Instant::now();

                while start.elapsed() < discovery_timeout {
                    let remaining = discovery_timeout.saturating_sub(start.elapsed());
                    match timeout(remaining, socket.recv_from(&mut buf)).await {
                        Ok(Ok((amt, src))) => {
                            let response = String::from_utf8_lossy(&buf[..amt]);
                            if let Some(host) = parse_ssdp_response(&response, device_type) {
                                log::debug!(
                                    "[SSDP] {} answered from {} via {}",
                                    host,
                                    src,
                                    iface_name
                                );
                                found.lock().await.push(host);
                            }
                        }
                        Ok(Err(e)) => {
                            log::warn!("[SSDP] Socket recv error on {}: {}", iface_name, e);
                        }
                        Err(_) => break, // Timeout
                    }
                }
            }
        })
        .collect();

    let (sent, _) = tokio::join!(
        futures::future::join_all(send_futures),
        futures::future::join_all(recv_futures)
    );

    if !sent.iter().any(|ok| *ok) {
        return Err(DiscoveryError::SearchFailed {
            device_type: device_type.to_string(),
            reason: "M-SEARCH could not be sent on any interface".to_string(),
        });
    }

    let mut hosts = std::mem::take(&mut *found.lock().await);
    let mut seen = HashSet::new();
    hosts.retain(|h| seen.insert(h.clone()));

    log::debug!(
        "[SSDP] Search for {} complete: {} host(s)",
        device_type,
        hosts.len()
    );

    Ok(hosts)
}
