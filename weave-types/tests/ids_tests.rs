use std::collections::HashSet;
use std::str::FromStr;
use weave_types::{MessageId, ReplicaId};

// ── ReplicaId ─────────────────────────────────────────────────────

#[test]
fn replica_id_new_is_unique() {
    let a = ReplicaId::new();
    let b = ReplicaId::new();
    assert_ne!(a, b);
}

#[test]
fn replica_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::new_v4();
    let id = ReplicaId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn replica_id_display_and_parse() {
    let id = ReplicaId::new();
    let s = id.to_string();
    let parsed = ReplicaId::parse(&s).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn replica_id_from_str() {
    let id = ReplicaId::new();
    let s = id.to_string();
    let parsed: ReplicaId = ReplicaId::from_str(&s).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn replica_id_parse_invalid() {
    assert!(ReplicaId::parse("not-a-uuid").is_err());
}

#[test]
fn replica_id_default_is_unique() {
    let a = ReplicaId::default();
    let b = ReplicaId::default();
    assert_ne!(a, b);
}

#[test]
fn replica_id_hash_and_eq() {
    let id = ReplicaId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

#[test]
fn replica_id_ord_is_total() {
    let a = ReplicaId::new();
    let b = ReplicaId::new();
    assert!(a < b || b < a || a == b);
}

#[test]
fn replica_id_serialization_roundtrip() {
    let id = ReplicaId::new();
    let json = serde_json::to_string(&id).unwrap();
    let parsed: ReplicaId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, parsed);
}

// ── MessageId ─────────────────────────────────────────────────────

#[test]
fn message_id_new_is_unique() {
    let a = MessageId::new();
    let b = MessageId::new();
    assert_ne!(a, b);
}

#[test]
fn message_id_display_and_parse() {
    let id = MessageId::new();
    let s = id.to_string();
    let parsed = MessageId::parse(&s).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn message_id_parse_invalid() {
    assert!(MessageId::parse("garbage").is_err());
}

#[test]
fn message_id_serialization_roundtrip() {
    let id = MessageId::new();
    let json = serde_json::to_string(&id).unwrap();
    let parsed: MessageId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, parsed);
}
