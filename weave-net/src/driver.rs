//! Drives one [`PeerSession`]'s request/response loop (spec §4.6): connect
//! (or reconnect), pull on every `sync_period` tick, and flush any
//! locally-queued edits as one coalesced push per tick (spec §4.6
//! backpressure: "additional local edits coalesce into the next
//! scheduled push"). Grounded on `privstack-sync::engine::SyncEngine`'s
//! "pure state machine, orchestrator does I/O" split — this module is
//! the orchestrator for exactly one peer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::sleep;
use tracing::{debug, warn};
use weave_crdt::{ChatCrdt, GridCrdt};
use weave_sync::{ChangeNotifier, SyncEngine, SyncPayload, WireOp};
use weave_types::{LamportTimestamp, ReplicaId};

use crate::error::SessionError;
use crate::session::{PeerSession, SessionState};

/// The replica's CRDT state behind the single serializing boundary spec
/// §5 requires. Every session driver and the session server share the
/// same handle.
pub type SharedCrdtState = Arc<Mutex<(GridCrdt, ChatCrdt)>>;

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub connect_timeout: Duration,
    pub sync_period: Duration,
}

impl DriverConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            sync_period: Duration::from_secs(3),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What [`crate::registry::SessionRegistry`] and the replica hold for a
/// running driver task: enough to observe its state and queue edits,
/// never the socket itself (spec §9 "cyclic references" redesign note).
pub struct SessionHandle {
    replica_id: ReplicaId,
    state_rx: watch::Receiver<SessionState>,
    edits_tx: mpsc::UnboundedSender<WireOp>,
}

impl SessionHandle {
    #[must_use]
    pub fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Queues a locally-produced op for fan-out to this peer. Queued ops
    /// coalesce into a single `push` on the next scheduled tick.
    pub fn queue_edit(&self, op: WireOp) -> Result<(), SessionError> {
        self.edits_tx.send(op).map_err(|_| SessionError::NotConnected)
    }
}

/// Spawns the driver task for one discovered peer and returns a handle
/// to it. The task owns the `PeerSession` (and therefore the socket)
/// exclusively; it runs until `shutdown` fires. `notifier` fires (spec
/// §6) whenever a pull actually ingests remote changes.
pub fn spawn_session_driver(
    replica_id: ReplicaId,
    addr: SocketAddr,
    shared_state: SharedCrdtState,
    engine: SyncEngine,
    notifier: ChangeNotifier,
    cfg: DriverConfig,
    mut shutdown: watch::Receiver<bool>,
) -> SessionHandle {
    let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);
    let (edits_tx, mut edits_rx) = mpsc::unbounded_channel::<WireOp>();

    tokio::spawn(async move {
        let mut session = PeerSession::new(replica_id, addr);
        let mut since: Option<LamportTimestamp> = None;

        loop {
            tokio::select! {
                _ = sleep(cfg.sync_period) => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            if !session.is_established() {
                if let Err(e) = session.connect(cfg.connect_timeout).await {
                    debug!(replica_id = %replica_id, "session connect failed: {e}");
                    let _ = state_tx.send(session.state());
                    continue;
                }
            }

            let queued = drain_queued(&mut edits_rx);
            if !queued.is_empty() {
                let payload = SyncPayload::Ops { since: None, ops: queued };
                if let Err(e) = session.push(payload).await {
                    warn!(replica_id = %replica_id, "push failed: {e}");
                    let _ = state_tx.send(session.state());
                    continue;
                }
            }

            match session.sync_request(since).await {
                Ok(payload) => {
                    let mut guard = shared_state.lock().await;
                    let (grid, chat) = &mut *guard;
                    if engine.ingest_payload(grid, chat, &payload) {
                        debug!(replica_id = %replica_id, "ingested remote changes");
                        notifier.notify();
                    }
                    since = latest_timestamp(grid, chat);
                }
                Err(e) => {
                    warn!(replica_id = %replica_id, "pull failed: {e}");
                }
            }

            let _ = state_tx.send(session.state());
        }

        session.disconnect();
        let _ = state_tx.send(SessionState::Disconnected);
    });

    SessionHandle {
        replica_id,
        state_rx,
        edits_tx,
    }
}

fn drain_queued(rx: &mut mpsc::UnboundedReceiver<WireOp>) -> Vec<WireOp> {
    let mut queued = Vec::new();
    while let Ok(op) = rx.try_recv() {
        queued.push(op);
    }
    queued
}

fn latest_timestamp(grid: &GridCrdt, chat: &ChatCrdt) -> Option<LamportTimestamp> {
    grid.latest_timestamp().into_iter().chain(chat.latest_timestamp()).max()
}
