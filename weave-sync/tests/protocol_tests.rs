use weave_sync::{Announcement, SyncPayload, WireMessage, WireOp, PROTOCOL_VERSION};
use weave_types::{LamportTimestamp, ReplicaId};

#[test]
fn announcement_roundtrips_through_json() {
    let announcement = Announcement::new(ReplicaId::new(), "laptop", "192.168.1.42", 12345, 1_700_000_000.0);
    let json = serde_json::to_string(&announcement).unwrap();
    assert!(json.contains("\"kind\""), "wrapping message tags kind, not the struct itself");
    let parsed: Announcement = serde_json::from_str(&json).unwrap();
    assert_eq!(announcement, parsed);
    assert!(parsed.is_compatible());
}

#[test]
fn announcement_wrapped_in_wire_message_carries_the_kind_tag() {
    let announcement = Announcement::new(ReplicaId::new(), "phone", "10.0.0.5", 12345, 1_700_000_001.0);
    let message = WireMessage::Announcement(announcement);
    let json = serde_json::to_string(&message).unwrap();
    assert!(json.contains("\"kind\":\"announcement\""));
    let parsed: WireMessage = serde_json::from_str(&json).unwrap();
    assert!(matches!(parsed, WireMessage::Announcement(_)));
}

#[test]
fn incompatible_protocol_version_is_detected() {
    let mut announcement = Announcement::new(ReplicaId::new(), "tablet", "10.0.0.9", 12345, 1_700_000_002.0);
    assert!(announcement.is_compatible());
    announcement.protocol_version = "0.9".to_string();
    assert!(!announcement.is_compatible());
    assert_ne!(announcement.protocol_version, PROTOCOL_VERSION);
}

#[test]
fn grid_op_roundtrips_as_set_cell() {
    let op = weave_crdt::GridOp {
        row: 2,
        col: 3,
        cell: weave_crdt::Cell {
            letter: Some('A'),
            is_black: false,
            number: Some(1),
            author: Some("alice".to_string()),
        },
        timestamp: LamportTimestamp::new(ReplicaId::new(), 7),
        author: "alice".to_string(),
    };
    let wire: WireOp = op.clone().into();
    let json = serde_json::to_string(&wire).unwrap();
    assert!(json.contains("\"kind\":\"set-cell\""));
    let parsed: WireOp = serde_json::from_str(&json).unwrap();
    let recovered = parsed.into_grid_op().unwrap();
    assert_eq!(recovered, op);
}

#[test]
fn chat_send_op_roundtrips() {
    let mut chat = weave_crdt::ChatCrdt::new(ReplicaId::new());
    let op = chat.send("hi", "alice");
    let wire: WireOp = op.clone().into();
    let json = serde_json::to_string(&wire).unwrap();
    assert!(json.contains("\"kind\":\"send\""));
    let parsed: WireOp = serde_json::from_str(&json).unwrap();
    let recovered = parsed.into_chat_op().unwrap();
    assert_eq!(recovered, op);
}

#[test]
fn wire_op_grid_and_chat_conversions_are_mutually_exclusive() {
    let mut grid = weave_crdt::GridCrdt::new(5, 5, ReplicaId::new());
    let grid_op = grid.set_letter(0, 0, Some('A'), "alice").unwrap();
    let wire: WireOp = grid_op.into();
    assert!(wire.clone().into_grid_op().is_some());
    assert!(wire.into_chat_op().is_none());
}

#[test]
fn sync_payload_state_variant_allows_either_document_alone() {
    let grid = weave_crdt::GridCrdt::new(3, 3, ReplicaId::new());
    let payload = SyncPayload::State {
        grid: Some(grid.state_digest()),
        chat: None,
    };
    let json = serde_json::to_string(&payload).unwrap();
    let parsed: SyncPayload = serde_json::from_str(&json).unwrap();
    match parsed {
        SyncPayload::State { grid, chat } => {
            assert!(grid.is_some());
            assert!(chat.is_none());
        }
        SyncPayload::Ops { .. } => panic!("expected a state payload"),
    }
}
