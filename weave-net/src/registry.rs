//! Tracks the running session driver for every peer this replica has
//! decided to sync with. Deliberately separate from
//! `weave_discovery::Peers` (spec §9: "peer ↔ session" must not cycle) —
//! this table holds [`SessionHandle`]s, never a [`weave_discovery::Peer`]
//! or a raw socket.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use weave_sync::{ChangeNotifier, SyncEngine};
use weave_types::ReplicaId;

use crate::driver::{spawn_session_driver, DriverConfig, SessionHandle, SharedCrdtState};
use crate::session::SessionState;

/// All currently-driven peer sessions, keyed by replica id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ReplicaId, SessionHandle>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a driver for `replica_id` at `addr` if one isn't already
    /// running. No-op if a session for this peer already exists —
    /// callers re-announce peers constantly (spec §4.5), this must stay
    /// idempotent.
    pub fn ensure_session(
        &self,
        replica_id: ReplicaId,
        addr: SocketAddr,
        shared_state: SharedCrdtState,
        engine: SyncEngine,
        notifier: ChangeNotifier,
        cfg: DriverConfig,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        if sessions.contains_key(&replica_id) {
            return;
        }
        let handle = spawn_session_driver(replica_id, addr, shared_state, engine, notifier, cfg, shutdown);
        sessions.insert(replica_id, handle);
    }

    /// Drops the handle for a peer that's been declared lost (spec §4.5
    /// liveness reaper). The driver task itself exits on its own
    /// shutdown signal or the next failed I/O; this only stops this
    /// replica from queuing further edits to it.
    pub fn remove(&self, replica_id: ReplicaId) {
        self.sessions.lock().expect("session registry poisoned").remove(&replica_id);
    }

    #[must_use]
    pub fn state_of(&self, replica_id: ReplicaId) -> Option<SessionState> {
        self.sessions
            .lock()
            .expect("session registry poisoned")
            .get(&replica_id)
            .map(SessionHandle::state)
    }

    /// Queues a locally-produced op for fan-out to every currently
    /// tracked peer. Peers with no live session simply miss this op
    /// until their next full-state sync after reconnecting.
    pub fn broadcast_edit(&self, op: weave_sync::WireOp) {
        let sessions = self.sessions.lock().expect("session registry poisoned");
        for handle in sessions.values() {
            let _ = handle.queue_edit(op.clone());
        }
    }

    #[must_use]
    pub fn replica_ids(&self) -> Vec<ReplicaId> {
        self.sessions.lock().expect("session registry poisoned").keys().copied().collect()
    }
}
