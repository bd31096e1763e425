//! TCP /24 sweep discovery (spec §4.5 strategy (B)).
//!
//! Grounded on `descubrimiento_nodos.py::DescubridorEscanPuertos`
//! (`_escanear_red_local`/`_probar_ip`/`_manejar_conexion_cliente`), but
//! replaces its one-raw-thread-per-address fan-out with a bounded worker
//! pool (`futures::stream::buffer_unordered`) capped at `SWEEP_BUDGET`
//! wall-clock time per sweep — the redesign spec §9 calls for explicitly
//! ("subnet sweep that fans out many short-lived connects").

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use weave_sync::{framing, Announcement};
use weave_types::ReplicaId;

use crate::error::DiscoveryError;
use crate::local_ip::detect_local_ip;
use crate::peer::{Peer, Peers};

/// Configuration for the sweep driver.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub ident_port: u16,
    pub sweep_interval: Duration,
    pub connect_timeout: Duration,
    pub sweep_budget: Duration,
    pub worker_concurrency: usize,
}

impl SweepConfig {
    #[must_use]
    pub fn new(ident_port: u16) -> Self {
        Self {
            ident_port,
            sweep_interval: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(2),
            sweep_budget: Duration::from_secs(10),
            worker_concurrency: 32,
        }
    }
}

/// Runs the periodic sweep of the local /24, feeding any identification
/// responses into the shared peers table. Each pass is capped at
/// `sweep_budget` wall-clock time; a pass that runs long is cut off
/// rather than delaying the next scheduled sweep indefinitely.
pub async fn run_sweep_driver(cfg: SweepConfig, self_id: ReplicaId, peers: Peers, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = sleep(cfg.sweep_interval) => {}
            _ = shutdown.changed() => return,
        }

        if *shutdown.borrow() {
            return;
        }

        if timeout(cfg.sweep_budget, sweep_once(&cfg, self_id, &peers)).await.is_err() {
            warn!("subnet sweep exceeded its budget of {:?}, cutting it short", cfg.sweep_budget);
        }
    }
}

async fn sweep_once(cfg: &SweepConfig, self_id: ReplicaId, peers: &Peers) {
    let local_ip = detect_local_ip().await;
    let IpAddr::V4(local_v4) = local_ip else {
        debug!("sweep skipped: local address {local_ip} is not IPv4");
        return;
    };
    let octets = local_v4.octets();
    let own_last_octet = octets[3];

    let targets: Vec<Ipv4Addr> = (1u8..=254)
        .filter(|&x| x != own_last_octet)
        .map(|x| Ipv4Addr::new(octets[0], octets[1], octets[2], x))
        .collect();

    let ident_port = cfg.ident_port;
    let connect_timeout = cfg.connect_timeout;

    let discovered: Vec<Peer> = stream::iter(targets)
        .map(|ip| async move { probe(ip, ident_port, connect_timeout, self_id).await })
        .buffer_unordered(cfg.worker_concurrency)
        .filter_map(|result| async move { result })
        .collect()
        .await;

    for peer in discovered {
        peers.upsert(peer).await;
    }
}

/// Probes one address for an identification server. A bare timeout is the
/// expected outcome for most of the 253 other addresses in the sweep and
/// is dropped silently; an actual connect or read failure (e.g. connection
/// refused mid-handshake) is a [`DiscoveryError::TransportTransient`] and
/// is logged as one, per spec §7, before this still returns `None` —
/// the sweep recovers by simply trying the address again next pass.
async fn probe(ip: Ipv4Addr, port: u16, connect_timeout: Duration, self_id: ReplicaId) -> Option<Peer> {
    let mut stream = match timeout(connect_timeout, TcpStream::connect((ip, port))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            let e = DiscoveryError::TransportTransient(format!("connect to {ip}:{port} failed: {e}"));
            debug!("{e}");
            return None;
        }
        Err(_) => return None,
    };
    let announcement: Announcement = match timeout(connect_timeout, framing::read_message(&mut stream)).await {
        Ok(Ok(announcement)) => announcement,
        Ok(Err(e)) => {
            let e = DiscoveryError::TransportTransient(format!("ident read from {ip}:{port} failed: {e}"));
            debug!("{e}");
            return None;
        }
        Err(_) => return None,
    };
    if announcement.replica_id == self_id {
        return None;
    }
    let address: IpAddr = announcement.local_ip.parse().unwrap_or(IpAddr::V4(ip));
    Some(Peer {
        replica_id: announcement.replica_id,
        display_name: announcement.display_name,
        address,
        service_port: announcement.service_port,
        protocol_version: announcement.protocol_version,
    })
}

/// Identity descriptor this replica replies with when probed.
#[derive(Debug, Clone)]
pub struct IdentityInfo {
    pub replica_id: ReplicaId,
    pub display_name: String,
    pub service_port: u16,
}

/// TCP server answering sweep probes with this replica's [`Announcement`]
/// (spec §4.5 (B), `_manejar_conexion_cliente`): accept, reply, close.
pub async fn run_ident_server(
    ident_port: u16,
    identity: IdentityInfo,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), DiscoveryError> {
    let listener = TcpListener::bind(("0.0.0.0", ident_port))
        .await
        .map_err(|e| DiscoveryError::Fatal(format!("bind ident port {ident_port}: {e}")))?;

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let identity = identity.clone();
                        tokio::spawn(async move {
                            if let Err(e) = reply_with_identity(stream, identity).await {
                                debug!("ident server connection failed: {e}");
                            }
                        });
                    }
                    Err(e) => warn!("ident server accept failed: {e}"),
                }
            }
            _ = shutdown.changed() => return Ok(()),
        }
    }
}

async fn reply_with_identity(mut stream: TcpStream, identity: IdentityInfo) -> std::io::Result<()> {
    let local_ip = detect_local_ip().await;
    let wall_timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    let announcement = Announcement::new(
        identity.replica_id,
        identity.display_name,
        local_ip.to_string(),
        identity.service_port,
        wall_timestamp,
    );
    framing::write_message(&mut stream, &announcement)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_discovers_an_identification_server_on_loopback() {
        let remote_id = ReplicaId::new();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            reply_with_identity(
                stream,
                IdentityInfo {
                    replica_id: remote_id,
                    display_name: "carol".to_string(),
                    service_port: 9001,
                },
            )
            .await
            .unwrap();
        });

        let found = probe(
            Ipv4Addr::new(127, 0, 0, 1),
            server_port,
            Duration::from_secs(1),
            ReplicaId::new(),
        )
        .await;

        let peer = found.expect("expected a peer from the loopback ident server");
        assert_eq!(peer.replica_id, remote_id);
        assert_eq!(peer.service_port, 9001);
    }

    #[tokio::test]
    async fn probe_ignores_its_own_identity() {
        let self_id = ReplicaId::new();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            reply_with_identity(
                stream,
                IdentityInfo {
                    replica_id: self_id,
                    display_name: "self".to_string(),
                    service_port: 9002,
                },
            )
            .await
            .unwrap();
        });

        let found = probe(Ipv4Addr::new(127, 0, 0, 1), server_port, Duration::from_secs(1), self_id).await;

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn probe_times_out_against_a_closed_port() {
        // Bind then immediately drop to get a port nothing is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_port = listener.local_addr().unwrap().port();
        drop(listener);

        let found = probe(
            Ipv4Addr::new(127, 0, 0, 1),
            dead_port,
            Duration::from_millis(200),
            ReplicaId::new(),
        )
        .await;

        assert!(found.is_none());
    }
}
