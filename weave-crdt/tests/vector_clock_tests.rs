use weave_crdt::{CausalOrder, VectorClock};
use weave_types::ReplicaId;

#[test]
fn new_clock_is_empty() {
    let vc = VectorClock::new();
    assert!(vc.is_empty());
}

#[test]
fn increment_advances_own_entry() {
    let r1 = ReplicaId::new();
    let mut vc = VectorClock::new();
    assert_eq!(vc.increment(r1), 1);
    assert_eq!(vc.increment(r1), 2);
    assert_eq!(vc.get(&r1), 2);
}

#[test]
fn merge_takes_the_max_per_replica() {
    let r1 = ReplicaId::new();
    let r2 = ReplicaId::new();
    let mut a = VectorClock::new();
    a.increment(r1);
    a.increment(r1);
    let mut b = VectorClock::new();
    b.increment(r2);

    let changed = a.merge(&b);
    assert!(changed);
    assert_eq!(a.get(&r1), 2);
    assert_eq!(a.get(&r2), 1);
}

#[test]
fn merge_reports_no_change_when_nothing_advances() {
    let r1 = ReplicaId::new();
    let mut a = VectorClock::new();
    a.increment(r1);
    a.increment(r1);
    let mut b = VectorClock::new();
    b.increment(r1);

    assert!(!a.merge(&b));
    assert_eq!(a.get(&r1), 2);
}

#[test]
fn merge_is_commutative() {
    let r1 = ReplicaId::new();
    let r2 = ReplicaId::new();
    let mut a = VectorClock::new();
    a.increment(r1);
    let mut b = VectorClock::new();
    b.increment(r2);
    b.increment(r2);

    assert_eq!(a.merged(&b), b.merged(&a));
}

#[test]
fn merge_is_idempotent() {
    let r1 = ReplicaId::new();
    let mut a = VectorClock::new();
    a.increment(r1);
    let once = a.merged(&a);
    let twice = once.merged(&a);
    assert_eq!(once, twice);
}

#[test]
fn compare_detects_before_after_and_concurrent() {
    let r1 = ReplicaId::new();
    let r2 = ReplicaId::new();

    let mut a = VectorClock::new();
    a.increment(r1);
    let mut b = a.clone();
    b.increment(r1);

    assert_eq!(a.compare(&b), CausalOrder::Before);
    assert_eq!(b.compare(&a), CausalOrder::After);

    let mut c = VectorClock::new();
    c.increment(r2);
    assert_eq!(a.compare(&c), CausalOrder::Concurrent);
}

#[test]
fn equal_clocks_compare_equal() {
    let r1 = ReplicaId::new();
    let mut a = VectorClock::new();
    a.increment(r1);
    let b = a.clone();
    assert_eq!(a.compare(&b), CausalOrder::Equal);
    assert_eq!(a, b);
}

#[test]
fn dominates_includes_equal() {
    let r1 = ReplicaId::new();
    let mut a = VectorClock::new();
    a.increment(r1);
    let b = a.clone();
    assert!(a.dominates(&b));
}

#[test]
fn serialization_roundtrip() {
    let r1 = ReplicaId::new();
    let mut vc = VectorClock::new();
    vc.increment(r1);
    let json = serde_json::to_string(&vc).unwrap();
    let parsed: VectorClock = serde_json::from_str(&json).unwrap();
    assert_eq!(vc, parsed);
}
