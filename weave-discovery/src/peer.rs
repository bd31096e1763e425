//! The shared peers table (spec §4.5) and the events it emits.
//!
//! Grounded on `privstack-sync::transport::DiscoveredPeer` for the field
//! shape, restructured as an owned, lockable table rather than a trait
//! method — spec §4.5 explicitly wants one shared table fed by both
//! discovery strategies, not a per-strategy view.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, Mutex};
use weave_sync::PROTOCOL_VERSION;
use weave_types::ReplicaId;

/// A peer learned via either discovery strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub replica_id: ReplicaId,
    pub display_name: String,
    pub address: IpAddr,
    pub service_port: u16,
    pub protocol_version: String,
}

impl Peer {
    /// Whether this peer speaks our protocol version (spec §7
    /// `ProtocolVersion`: kept in the discovery set, excluded from sync).
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

#[derive(Debug, Clone)]
struct Entry {
    peer: Peer,
    last_seen: Instant,
}

/// Discovered/lost notifications, delivered FIFO to every subscriber
/// (spec §4.5 "single-threaded notification channel").
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    Discovered(Peer),
    Lost(Peer),
}

/// Aggregate counts, mirroring `GestorDescubrimiento::obtener_estadisticas`
/// from the original source — observability only, never used for protocol
/// decisions (spec §2 supplement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerStats {
    pub total_peers: usize,
    pub compatible_peers: usize,
}

/// Shared table of discovered peers, keyed by `replica_id`. Protected by
/// a single lock held only for short lookups/updates (spec §5 shared
/// resource policy); discovery, liveness, and peer-session components
/// all hold a clone of this handle.
#[derive(Clone)]
pub struct Peers {
    entries: Arc<Mutex<HashMap<ReplicaId, Entry>>>,
    events: broadcast::Sender<DiscoveryEvent>,
}

impl Peers {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    /// Subscribes to discovered/lost events. Each subscriber gets its own
    /// FIFO-ordered receiver; a slow subscriber only drops its own old
    /// events (tokio broadcast semantics), never blocks the table.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.events.subscribe()
    }

    /// Inserts a new peer or refreshes `last_seen` for an existing one.
    /// Fires a `Discovered` event only the first time a `replica_id` is
    /// seen, per spec §4.5 (A)/(B).
    pub async fn upsert(&self, peer: Peer) {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(&peer.replica_id) {
            Some(existing) => {
                existing.peer = peer;
                existing.last_seen = Instant::now();
            }
            None => {
                let replica_id = peer.replica_id;
                entries.insert(
                    replica_id,
                    Entry {
                        peer: peer.clone(),
                        last_seen: Instant::now(),
                    },
                );
                let _ = self.events.send(DiscoveryEvent::Discovered(peer));
            }
        }
    }

    /// Removes every peer whose `last_seen` is older than `timeout`,
    /// firing a `Lost` event for each (spec §4.5 liveness reaper).
    pub async fn reap_expired(&self, timeout: std::time::Duration) -> Vec<Peer> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let expired: Vec<ReplicaId> = entries
            .iter()
            .filter(|(_, e)| now.duration_since(e.last_seen) > timeout)
            .map(|(id, _)| *id)
            .collect();
        let mut lost = Vec::with_capacity(expired.len());
        for replica_id in expired {
            if let Some(entry) = entries.remove(&replica_id) {
                lost.push(entry.peer.clone());
                let _ = self.events.send(DiscoveryEvent::Lost(entry.peer));
            }
        }
        lost
    }

    /// A snapshot of every currently-known peer.
    pub async fn snapshot(&self) -> Vec<Peer> {
        self.entries.lock().await.values().map(|e| e.peer.clone()).collect()
    }

    /// Looks up one peer by id.
    pub async fn get(&self, replica_id: ReplicaId) -> Option<Peer> {
        self.entries.lock().await.get(&replica_id).map(|e| e.peer.clone())
    }

    pub async fn stats(&self) -> PeerStats {
        let entries = self.entries.lock().await;
        PeerStats {
            total_peers: entries.len(),
            compatible_peers: entries.values().filter(|e| e.peer.is_compatible()).count(),
        }
    }
}

impl Default for Peers {
    fn default() -> Self {
        Self::new()
    }
}
