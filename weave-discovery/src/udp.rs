//! UDP announce/listen discovery (spec §4.5 strategy (A)).
//!
//! Grounded on `descubrimiento_nodos.py::DescubridorUDPBroadcast`
//! (`_enviar_broadcasts`/`_escuchar_broadcasts`), reimplemented with
//! `tokio::net::UdpSocket` and cooperative cancellation instead of
//! Python's daemon threads + socket timeout polling (spec §5/§9).

use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use weave_sync::Announcement;
use weave_types::ReplicaId;

use crate::error::DiscoveryError;
use crate::local_ip::detect_local_ip;
use crate::peer::{Peer, Peers};

const MAX_DATAGRAM_SIZE: usize = 2048;

/// Configuration for the announcer task.
#[derive(Debug, Clone)]
pub struct AnnounceConfig {
    pub replica_id: ReplicaId,
    pub display_name: String,
    pub service_port: u16,
    pub discovery_port: u16,
    pub broadcast_interval: Duration,
}

/// Periodically broadcasts an [`Announcement`] on the local subnet's
/// broadcast address. Runs until `shutdown` is signalled.
pub async fn run_announcer(cfg: AnnounceConfig, mut shutdown: watch::Receiver<bool>) -> Result<(), DiscoveryError> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| DiscoveryError::Fatal(format!("bind announce socket: {e}")))?;
    socket
        .set_broadcast(true)
        .map_err(|e| DiscoveryError::Fatal(format!("enable SO_BROADCAST: {e}")))?;

    let target = format!("255.255.255.255:{}", cfg.discovery_port);

    loop {
        if *shutdown.borrow() {
            return Ok(());
        }

        let local_ip = detect_local_ip().await;
        let wall_timestamp = now_as_unix_seconds();
        let announcement = Announcement::new(
            cfg.replica_id,
            cfg.display_name.clone(),
            local_ip.to_string(),
            cfg.service_port,
            wall_timestamp,
        );

        match serde_json::to_vec(&announcement) {
            Ok(bytes) => {
                if let Err(e) = socket.send_to(&bytes, &target).await {
                    let e = DiscoveryError::TransportTransient(format!("announce send failed: {e}"));
                    warn!("{e}");
                } else {
                    debug!(replica_id = %cfg.replica_id, "announcement sent");
                }
            }
            Err(e) => warn!("failed to encode announcement: {e}"),
        }

        tokio::select! {
            _ = sleep(cfg.broadcast_interval) => {}
            _ = shutdown.changed() => return Ok(()),
        }
    }
}

/// Listens for announcements from other replicas, dropping its own and
/// feeding everything else into the shared peers table.
pub async fn run_listener(
    discovery_port: u16,
    self_id: ReplicaId,
    peers: Peers,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), DiscoveryError> {
    let socket = UdpSocket::bind(("0.0.0.0", discovery_port))
        .await
        .map_err(|e| DiscoveryError::Fatal(format!("bind discovery port {discovery_port}: {e}")))?;

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, _addr)) => process_datagram(&buf[..len], self_id, &peers).await,
                    Err(e) => {
                        let e = DiscoveryError::TransportTransient(format!("udp recv failed: {e}"));
                        warn!("{e}");
                    }
                }
            }
            _ = shutdown.changed() => return Ok(()),
        }
    }
}

async fn process_datagram(bytes: &[u8], self_id: ReplicaId, peers: &Peers) {
    let announcement: Announcement = match serde_json::from_slice(bytes) {
        Ok(a) => a,
        Err(e) => {
            debug!("dropping malformed announcement: {e}");
            return;
        }
    };
    if announcement.app_tag != weave_sync::APP_TAG {
        return;
    }
    if announcement.replica_id == self_id {
        return;
    }
    let Ok(address) = announcement.local_ip.parse() else {
        debug!("dropping announcement with unparseable address: {}", announcement.local_ip);
        return;
    };
    if !announcement.is_compatible() {
        info!(
            replica_id = %announcement.replica_id,
            got = %announcement.protocol_version,
            "peer announced incompatible protocol version"
        );
    }
    let peer = Peer {
        replica_id: announcement.replica_id,
        display_name: announcement.display_name,
        address,
        service_port: announcement.service_port,
        protocol_version: announcement.protocol_version,
    };
    peers.upsert(peer).await;
}

fn now_as_unix_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
