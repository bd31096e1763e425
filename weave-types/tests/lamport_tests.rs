use weave_types::{LamportClock, LamportTimestamp, ReplicaId};

// ── Ordering ─────────────────────────────────────────────────────

#[test]
fn ordering_by_counter_first() {
    let r1 = ReplicaId::new();
    let r2 = ReplicaId::new();
    let a = LamportTimestamp::new(r1, 1);
    let b = LamportTimestamp::new(r2, 2);
    assert!(a < b);
}

#[test]
fn ordering_by_replica_id_when_counter_equal() {
    let r1 = ReplicaId::new();
    let r2 = ReplicaId::new();
    let (low, high) = if r1 < r2 { (r1, r2) } else { (r2, r1) };
    let a = LamportTimestamp::new(low, 5);
    let b = LamportTimestamp::new(high, 5);
    assert!(a < b);
}

#[test]
fn equal_timestamps_are_equal() {
    let r = ReplicaId::new();
    let a = LamportTimestamp::new(r, 3);
    let b = LamportTimestamp::new(r, 3);
    assert_eq!(a, b);
    assert!(!(a < b));
}

#[test]
fn total_order_is_consistent_with_ord() {
    let r1 = ReplicaId::new();
    let r2 = ReplicaId::new();
    let a = LamportTimestamp::new(r1, 1);
    let b = LamportTimestamp::new(r2, 1);
    let cmp = a.partial_cmp(&b);
    assert_eq!(cmp, Some(a.cmp(&b)));
}

// ── LamportClock::tick ───────────────────────────────────────────

#[test]
fn tick_is_monotonic() {
    let mut clock = LamportClock::new(ReplicaId::new());
    let t1 = clock.tick();
    let t2 = clock.tick();
    let t3 = clock.tick();
    assert!(t1 < t2);
    assert!(t2 < t3);
}

#[test]
fn tick_always_uses_the_clock_s_replica_id() {
    let replica = ReplicaId::new();
    let mut clock = LamportClock::new(replica);
    let ts = clock.tick();
    assert_eq!(ts.replica_id(), replica);
}

#[test]
fn tick_starts_at_one() {
    let mut clock = LamportClock::new(ReplicaId::new());
    let ts = clock.tick();
    assert_eq!(ts.counter(), 1);
}

// ── LamportClock::observe ────────────────────────────────────────

#[test]
fn observe_advances_past_a_higher_remote_counter() {
    let mut clock = LamportClock::new(ReplicaId::new());
    clock.tick(); // counter = 1
    let remote = LamportTimestamp::new(ReplicaId::new(), 10);
    clock.observe(remote);
    assert_eq!(clock.counter(), 10);
    let next = clock.tick();
    assert_eq!(next.counter(), 11);
}

#[test]
fn observe_never_moves_the_clock_backwards() {
    let mut clock = LamportClock::new(ReplicaId::new());
    clock.tick();
    clock.tick();
    clock.tick(); // counter = 3
    let remote = LamportTimestamp::new(ReplicaId::new(), 1);
    clock.observe(remote);
    assert_eq!(clock.counter(), 3);
}

#[test]
fn observe_then_tick_is_strictly_greater_than_observed() {
    let mut clock = LamportClock::new(ReplicaId::new());
    let remote = LamportTimestamp::new(ReplicaId::new(), 41);
    clock.observe(remote);
    let minted = clock.tick();
    assert!(minted > remote);
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn serialization_roundtrip() {
    let ts = LamportTimestamp::new(ReplicaId::new(), 99);
    let json = serde_json::to_string(&ts).unwrap();
    let parsed: LamportTimestamp = serde_json::from_str(&json).unwrap();
    assert_eq!(ts, parsed);
}

#[test]
fn hash_consistent_with_eq() {
    use std::collections::HashSet;
    let ts = LamportTimestamp::new(ReplicaId::new(), 7);
    let mut set = HashSet::new();
    set.insert(ts);
    set.insert(ts);
    assert_eq!(set.len(), 1);
}
