//! Vector clock: a per-replica counter map used only as a convergence
//! digest for chat full-state sync. Never gates message acceptance —
//! the grid and chat apply rules compare Lamport timestamps instead.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use weave_types::ReplicaId;

/// Causality relationship between two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausalOrder {
    Before,
    After,
    Concurrent,
    Equal,
}

/// Map from `replica_id` to the highest counter observed from that replica.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorClock {
    clocks: HashMap<ReplicaId, u64>,
}

impl VectorClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clocks: HashMap::new(),
        }
    }

    #[must_use]
    pub fn for_replica(replica_id: ReplicaId) -> Self {
        let mut clocks = HashMap::new();
        clocks.insert(replica_id, 0);
        Self { clocks }
    }

    #[must_use]
    pub fn get(&self, replica_id: &ReplicaId) -> u64 {
        self.clocks.get(replica_id).copied().unwrap_or(0)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ReplicaId, &u64)> {
        self.clocks.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    /// Advances this replica's own entry by one and returns the new counter.
    pub fn increment(&mut self, replica_id: ReplicaId) -> u64 {
        let entry = self.clocks.entry(replica_id).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Merges `other` into `self`: for each replica, takes the max counter.
    /// Returns whether any entry in `self` increased — the `vc_merge`
    /// contract from spec §4.1.
    pub fn merge(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (&replica_id, &counter) in &other.clocks {
            let entry = self.clocks.entry(replica_id).or_insert(0);
            if counter > *entry {
                *entry = counter;
                changed = true;
            }
        }
        changed
    }

    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    #[must_use]
    pub fn compare(&self, other: &Self) -> CausalOrder {
        let mut dominated_by_self = true;
        let mut dominated_by_other = true;

        let all_replicas: HashSet<_> = self
            .clocks
            .keys()
            .chain(other.clocks.keys())
            .copied()
            .collect();

        for replica_id in all_replicas {
            let self_time = self.get(&replica_id);
            let other_time = other.get(&replica_id);

            if self_time < other_time {
                dominated_by_self = false;
            }
            if other_time < self_time {
                dominated_by_other = false;
            }
        }

        match (dominated_by_self, dominated_by_other) {
            (true, true) => CausalOrder::Equal,
            (true, false) => CausalOrder::After,
            (false, true) => CausalOrder::Before,
            (false, false) => CausalOrder::Concurrent,
        }
    }

    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Before
    }

    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::After
    }

    #[must_use]
    pub fn is_concurrent(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Concurrent
    }

    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        matches!(self.compare(other), CausalOrder::After | CausalOrder::Equal)
    }
}

impl PartialEq for VectorClock {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Equal
    }
}

impl Eq for VectorClock {}
