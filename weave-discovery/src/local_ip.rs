//! Local-IP detection via the UDP "connect" trick (spec §4.5).
//!
//! Grounded on `descubrimiento_nodos.py::_obtener_ip_local`: opening a UDP
//! socket and "connecting" it to a non-local address never actually sends
//! a packet, it only makes the OS pick a source address for the route —
//! which is exactly the local LAN IP we want to announce.

use std::net::IpAddr;
use tokio::net::UdpSocket;

/// A public, non-routed-to address used only to make the OS resolve a
/// route and pick a source IP. No packet is ever sent here.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

/// Detects this host's LAN-facing IP address. Falls back to loopback on
/// any failure (offline host, no default route, etc.) per spec §4.5.
pub async fn detect_local_ip() -> IpAddr {
    match try_detect().await {
        Ok(ip) => ip,
        Err(_) => IpAddr::from([127, 0, 0, 1]),
    }
}

async fn try_detect() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(ROUTE_PROBE_ADDR).await?;
    Ok(socket.local_addr()?.ip())
}
