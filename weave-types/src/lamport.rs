//! Lamport timestamps and the per-replica clock that mints them.
//!
//! This is deliberately a plain Lamport clock, not a hybrid logical clock:
//! spec §9 flags wall-clock-blended comparison as a known weakness of the
//! chat full-state merge path, and recommends Lamport comparison wherever
//! an implementer has a choice. The grid CRDT's per-cell apply rule (§4.2)
//! always uses this type; only the chat state-digest path (§4.3) also
//! looks at wall-clock time, and only where the spec says it may.

use crate::ReplicaId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// `(replica_id, counter)` with the total order defined in spec §3:
/// compare `counter` first, then `replica_id` lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LamportTimestamp {
    replica_id: ReplicaId,
    counter: u64,
}

impl LamportTimestamp {
    /// Builds a timestamp from explicit components (decoding the wire
    /// format, or constructing fixtures in tests).
    #[must_use]
    pub const fn new(replica_id: ReplicaId, counter: u64) -> Self {
        Self {
            replica_id,
            counter,
        }
    }

    /// The replica that minted this timestamp.
    #[must_use]
    pub const fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }

    /// The logical counter value.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.counter
    }
}

impl PartialOrd for LamportTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LamportTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.counter.cmp(&other.counter) {
            Ordering::Equal => self.replica_id.cmp(&other.replica_id),
            other => other,
        }
    }
}

/// A replica's local Lamport clock.
///
/// Owns the monotonic counter for one replica. `tick` is the only way to
/// mint a new local timestamp; `observe` advances the local counter past
/// any timestamp seen on an incoming payload, so that the next locally
/// minted timestamp is guaranteed to be newer than anything received so
/// far (standard Lamport-clock behavior — see GLOSSARY).
#[derive(Debug, Clone)]
pub struct LamportClock {
    replica_id: ReplicaId,
    counter: u64,
}

impl LamportClock {
    /// Creates a clock for the given replica, counter starting at zero.
    #[must_use]
    pub const fn new(replica_id: ReplicaId) -> Self {
        Self {
            replica_id,
            counter: 0,
        }
    }

    /// The replica this clock belongs to.
    #[must_use]
    pub const fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }

    /// Increments the counter and mints a new timestamp. Monotonic: every
    /// call returns a strictly greater timestamp than the last.
    pub fn tick(&mut self) -> LamportTimestamp {
        self.counter += 1;
        LamportTimestamp::new(self.replica_id, self.counter)
    }

    /// Advances the local counter so that it is at least as large as an
    /// observed remote timestamp's counter. Does not mint a timestamp.
    pub fn observe(&mut self, remote: LamportTimestamp) {
        if remote.counter > self.counter {
            self.counter = remote.counter;
        }
    }

    /// The current counter value, without minting a new timestamp.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.counter
    }
}
