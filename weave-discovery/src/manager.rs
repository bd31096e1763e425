//! Wires the fixed set of discovery tasks together (spec §5): one
//! announcer, one listener, one sweep driver, one identification server,
//! one liveness reaper, all joined at shutdown via a cooperative flag.
//! Grounded on `GestorDescubrimiento` for the "coordinate several
//! independent discovery algorithms behind one facade" shape, replacing
//! its thread-per-algorithm model with a fixed tokio task set.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;
use weave_types::ReplicaId;

use crate::peer::Peers;
use crate::sweep::{IdentityInfo, SweepConfig};
use crate::udp::AnnounceConfig;
use crate::{liveness, sweep, udp};

/// Every interval named in spec §4.5, with the spec's defaults.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub replica_id: ReplicaId,
    pub display_name: String,
    pub service_port: u16,
    pub discovery_port: u16,
    pub ident_port: u16,
    pub broadcast_interval: Duration,
    pub sweep_interval: Duration,
    pub connect_timeout: Duration,
    pub sweep_budget: Duration,
    pub liveness_period: Duration,
    pub timeout: Duration,
}

impl DiscoveryConfig {
    #[must_use]
    pub fn new(replica_id: ReplicaId, display_name: impl Into<String>, service_port: u16, base_port: u16) -> Self {
        Self {
            replica_id,
            display_name: display_name.into(),
            service_port,
            discovery_port: weave_types::discovery_port(base_port),
            ident_port: weave_types::ident_port(base_port),
            broadcast_interval: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(2),
            sweep_budget: Duration::from_secs(10),
            liveness_period: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
        }
    }
}

/// A running discovery subsystem: the shared peers table plus the five
/// background tasks that keep it current.
pub struct Discovery {
    peers: Peers,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Discovery {
    /// Spawns the fixed discovery task set and returns a handle owning it.
    #[must_use]
    pub fn spawn(cfg: DiscoveryConfig) -> Self {
        let peers = Peers::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut handles = Vec::with_capacity(5);

        let announce_cfg = AnnounceConfig {
            replica_id: cfg.replica_id,
            display_name: cfg.display_name.clone(),
            service_port: cfg.service_port,
            discovery_port: cfg.discovery_port,
            broadcast_interval: cfg.broadcast_interval,
        };
        handles.push(tokio::spawn(run_logged(
            "udp-announcer",
            udp::run_announcer(announce_cfg, shutdown_rx.clone()),
        )));

        handles.push(tokio::spawn(run_logged(
            "udp-listener",
            udp::run_listener(cfg.discovery_port, cfg.replica_id, peers.clone(), shutdown_rx.clone()),
        )));

        let mut sweep_cfg = SweepConfig::new(cfg.ident_port);
        sweep_cfg.sweep_interval = cfg.sweep_interval;
        sweep_cfg.connect_timeout = cfg.connect_timeout;
        sweep_cfg.sweep_budget = cfg.sweep_budget;
        handles.push(tokio::spawn(sweep::run_sweep_driver(
            sweep_cfg,
            cfg.replica_id,
            peers.clone(),
            shutdown_rx.clone(),
        )));

        let identity = IdentityInfo {
            replica_id: cfg.replica_id,
            display_name: cfg.display_name,
            service_port: cfg.service_port,
        };
        handles.push(tokio::spawn(run_logged(
            "ident-server",
            sweep::run_ident_server(cfg.ident_port, identity, shutdown_rx.clone()),
        )));

        handles.push(tokio::spawn(liveness::run_liveness_reaper(
            peers.clone(),
            cfg.liveness_period,
            cfg.timeout,
            shutdown_rx,
        )));

        Self {
            peers,
            shutdown_tx,
            handles,
        }
    }

    /// The shared peers table. Clone freely; it's a cheap handle.
    #[must_use]
    pub fn peers(&self) -> Peers {
        self.peers.clone()
    }

    /// Signals every task to stop and waits (up to 2s total, spec §5) for
    /// them to join.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        let deadline = Duration::from_secs(2);
        for handle in self.handles.drain(..) {
            if tokio::time::timeout(deadline, handle).await.is_err() {
                error!("discovery task did not join within shutdown deadline");
            }
        }
    }
}

async fn run_logged<F>(name: &'static str, fut: F)
where
    F: std::future::Future<Output = Result<(), crate::error::DiscoveryError>>,
{
    if let Err(e) = fut.await {
        error!("{name} exited with error: {e}");
    }
}
