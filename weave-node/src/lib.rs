//! The replica: owns the grid and chat CRDTs behind one lock, the
//! discovery subsystem, and the table of peer sessions kept in sync with
//! it (spec §5/§6). Grounded on `privstack-relay`'s "one process, one
//! `main` that wires everything and tracks handles for shutdown" shape,
//! generalized from a stateless relay to a stateful replica that an
//! editor front-end drives directly.

pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use weave_crdt::{ChatCrdt, Direction, GridCrdt, GridSnapshot, Message};
use weave_discovery::{Discovery, DiscoveryConfig, DiscoveryEvent};
use weave_net::{DriverConfig, SessionRegistry, SharedCrdtState};
use weave_sync::{ChangeNotifier, SyncEngine};
use weave_types::{LamportTimestamp, MessageId, ReplicaId};

pub use config::ReplicaConfig;
pub use weave_crdt::CrdtError;

/// One running replica process: its CRDT state, discovery subsystem,
/// and peer session registry, plus the background tasks tying them
/// together.
pub struct Replica {
    replica_id: ReplicaId,
    display_name: String,
    state: SharedCrdtState,
    discovery: Discovery,
    registry: Arc<SessionRegistry>,
    notifier: ChangeNotifier,
    server_handle: JoinHandle<()>,
    watcher_handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl Replica {
    /// Boots a replica: mints a fresh identity, starts discovery, the
    /// session server, and the task that turns discovery events into
    /// peer sessions.
    #[must_use]
    pub async fn start(cfg: ReplicaConfig) -> Self {
        let replica_id = ReplicaId::new();
        let state: SharedCrdtState = Arc::new(Mutex::new((
            GridCrdt::new(cfg.rows, cfg.cols, replica_id),
            ChatCrdt::new(replica_id),
        )));
        let engine = SyncEngine::new();
        let notifier = ChangeNotifier::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut discovery_cfg = DiscoveryConfig::new(replica_id, cfg.display_name.clone(), cfg.base_port, cfg.base_port);
        discovery_cfg.broadcast_interval = std::time::Duration::from_secs(cfg.broadcast_interval_secs);
        discovery_cfg.sweep_interval = std::time::Duration::from_secs(cfg.sweep_interval_secs);
        discovery_cfg.connect_timeout = cfg.connect_timeout();
        discovery_cfg.sweep_budget = std::time::Duration::from_secs(cfg.sweep_budget_secs);
        discovery_cfg.timeout = std::time::Duration::from_secs(cfg.liveness_timeout_secs);
        let discovery = Discovery::spawn(discovery_cfg);

        let driver_cfg = DriverConfig {
            connect_timeout: cfg.connect_timeout(),
            sync_period: cfg.sync_period(),
        };

        let server_addr: SocketAddr = cfg.service_addr();
        let server_handle = {
            let state = state.clone();
            let engine = engine;
            let notifier = notifier.clone();
            let shutdown_rx = shutdown_rx.clone();
            tokio::spawn(async move {
                if let Err(e) = weave_net::run_session_server(server_addr, state, engine, notifier, shutdown_rx).await {
                    warn!("session server exited: {e}");
                }
            })
        };

        let registry = Arc::new(SessionRegistry::new());
        let watcher_handle = spawn_peer_watcher(
            discovery.peers(),
            registry.clone(),
            state.clone(),
            engine,
            notifier.clone(),
            driver_cfg,
            shutdown_rx,
        );

        info!(%replica_id, base_port = cfg.base_port, "replica started");

        Self {
            replica_id,
            display_name: cfg.display_name,
            state,
            discovery,
            registry,
            notifier,
            server_handle,
            watcher_handle,
            shutdown_tx,
        }
    }

    #[must_use]
    pub fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.registry.replica_ids().len()
    }

    /// Subscribes to this replica's change notifications (spec §6
    /// Observer): fires with no payload after every accepted local or
    /// remote mutation. A lagging subscriber only misses its own
    /// backlog of signals, never blocks the mutation path.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.notifier.subscribe()
    }

    // -- Grid operations (spec §6 editor-facing surface) --

    pub async fn set_letter(&self, row: usize, col: usize, letter: Option<char>, author: &str) -> Result<(), CrdtError> {
        let mut guard = self.state.lock().await;
        let op = guard.0.set_letter(row, col, letter, author)?;
        drop(guard);
        self.registry.broadcast_edit(op.into());
        self.notifier.notify();
        Ok(())
    }

    pub async fn set_black(&self, row: usize, col: usize, author: &str) -> Result<(), CrdtError> {
        let mut guard = self.state.lock().await;
        let op = guard.0.set_black(row, col, author)?;
        drop(guard);
        self.registry.broadcast_edit(op.into());
        self.notifier.notify();
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_word(
        &self,
        clue: &str,
        answer: &str,
        row: usize,
        col: usize,
        direction: Direction,
        author: &str,
    ) -> Result<u32, CrdtError> {
        let mut guard = self.state.lock().await;
        let number = guard.0.add_word(clue, answer, row, col, direction, author)?;
        drop(guard);
        self.notifier.notify();
        Ok(number)
    }

    pub async fn get_snapshot(&self) -> GridSnapshot {
        self.state.lock().await.0.get_snapshot()
    }

    // -- Chat operations --

    pub async fn send_message(&self, content: &str, author: &str) {
        let mut guard = self.state.lock().await;
        let op = guard.1.send(content, author);
        drop(guard);
        self.registry.broadcast_edit(op.into());
        self.notifier.notify();
    }

    pub async fn edit_message(&self, message_id: MessageId, new_content: &str, author: &str) -> Result<(), CrdtError> {
        let mut guard = self.state.lock().await;
        let op = guard.1.edit(message_id, new_content, author)?;
        drop(guard);
        self.registry.broadcast_edit(op.into());
        self.notifier.notify();
        Ok(())
    }

    pub async fn delete_message(&self, message_id: MessageId, author: &str) -> Result<(), CrdtError> {
        let mut guard = self.state.lock().await;
        let op = guard.1.delete(message_id, author)?;
        drop(guard);
        self.registry.broadcast_edit(op.into());
        self.notifier.notify();
        Ok(())
    }

    pub async fn messages_in_channel(&self) -> Vec<Message> {
        self.state.lock().await.1.messages_in_channel()
    }

    pub async fn search_messages(&self, query: &str) -> Vec<Message> {
        self.state.lock().await.1.search(query)
    }

    pub async fn latest_timestamp(&self) -> Option<LamportTimestamp> {
        let guard = self.state.lock().await;
        guard.0.latest_timestamp().into_iter().chain(guard.1.latest_timestamp()).max()
    }

    /// Signals every background task to stop and joins them (spec §5/§9
    /// cooperative shutdown), then tears down discovery last so peers
    /// stop hearing from this replica only once its own tasks are gone.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if self.server_handle.await.is_err() {
            warn!("session server task panicked during shutdown");
        }
        if self.watcher_handle.await.is_err() {
            warn!("peer watcher task panicked during shutdown");
        }
        self.discovery.shutdown().await;
    }
}

/// Turns discovery events into peer sessions: a `Discovered` peer gets a
/// driver spawned (or is ignored if incompatible or already tracked); a
/// `Lost` peer's handle is dropped from the registry.
fn spawn_peer_watcher(
    peers: weave_discovery::Peers,
    registry: Arc<SessionRegistry>,
    state: SharedCrdtState,
    engine: SyncEngine,
    notifier: ChangeNotifier,
    driver_cfg: DriverConfig,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = peers.subscribe();
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(DiscoveryEvent::Discovered(peer)) => {
                            if !peer.is_compatible() {
                                continue;
                            }
                            let addr = SocketAddr::new(peer.address, peer.service_port);
                            registry.ensure_session(
                                peer.replica_id,
                                addr,
                                state.clone(),
                                engine,
                                notifier.clone(),
                                driver_cfg.clone(),
                                shutdown.clone(),
                            );
                        }
                        Ok(DiscoveryEvent::Lost(peer)) => {
                            registry.remove(peer.replica_id);
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    })
}
