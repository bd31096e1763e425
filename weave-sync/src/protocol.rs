//! Wire protocol messages (spec §6). Every on-wire payload is a single
//! text-encoded object with a `kind` discriminator; `serde`'s internally
//! tagged representation gives that for free.

use serde::{Deserialize, Serialize};
use weave_crdt::{Cell, ChatOp, ChatOpKey, ChatOpKind, ChatStateDigest, GridOp, GridStateDigest, Message};
use weave_types::{LamportTimestamp, MessageId, ReplicaId};

/// Protocol version this build speaks. A peer announcing a different
/// version is kept in the discovery set but excluded from sync.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Identifies this application on the wire, distinguishing a WeaveMesh
/// announcement from any other UDP broadcast traffic on the same LAN.
pub const APP_TAG: &str = "weavemesh";

/// Periodic discovery broadcast (spec §4.5(A)), also the reply sent by
/// the TCP identification server in §4.5(B).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub replica_id: ReplicaId,
    pub display_name: String,
    pub local_ip: String,
    pub service_port: u16,
    pub wall_timestamp: f64,
    pub protocol_version: String,
    pub app_tag: String,
}

impl Announcement {
    #[must_use]
    pub fn new(replica_id: ReplicaId, display_name: impl Into<String>, local_ip: impl Into<String>, service_port: u16, wall_timestamp: f64) -> Self {
        Self {
            replica_id,
            display_name: display_name.into(),
            local_ip: local_ip.into(),
            service_port,
            wall_timestamp,
            protocol_version: PROTOCOL_VERSION.to_string(),
            app_tag: APP_TAG.to_string(),
        }
    }

    /// Whether this announcement speaks our protocol version.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// The generic operation record from spec §3, shared on the wire between
/// the grid's `set-cell` and the chat CRDT's `send`/`edit`/`delete`/
/// `create-channel`. `weave-crdt` keeps `GridOp`/`ChatOp` as two separate
/// concrete types (their key/value shapes genuinely differ); this enum
/// is the wire-level union the two fold into for transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WireOp {
    #[serde(rename = "set-cell")]
    SetCell {
        key: (usize, usize),
        value: Cell,
        timestamp: LamportTimestamp,
        author: String,
    },
    #[serde(rename = "send")]
    Send {
        key: MessageId,
        value: Option<Message>,
        timestamp: LamportTimestamp,
        author: String,
    },
    #[serde(rename = "edit")]
    Edit {
        key: MessageId,
        value: Option<Message>,
        timestamp: LamportTimestamp,
        author: String,
    },
    #[serde(rename = "delete")]
    Delete {
        key: MessageId,
        value: Option<Message>,
        timestamp: LamportTimestamp,
        author: String,
    },
    #[serde(rename = "create-channel")]
    CreateChannel {
        key: String,
        value: Option<Message>,
        timestamp: LamportTimestamp,
        author: String,
    },
}

impl From<GridOp> for WireOp {
    fn from(op: GridOp) -> Self {
        WireOp::SetCell {
            key: (op.row, op.col),
            value: op.cell,
            timestamp: op.timestamp,
            author: op.author,
        }
    }
}

impl From<ChatOp> for WireOp {
    fn from(op: ChatOp) -> Self {
        match op.key {
            ChatOpKey::Message(id) => match op.kind {
                ChatOpKind::Send => WireOp::Send { key: id, value: op.value, timestamp: op.timestamp, author: op.author },
                ChatOpKind::Edit => WireOp::Edit { key: id, value: op.value, timestamp: op.timestamp, author: op.author },
                ChatOpKind::Delete => WireOp::Delete { key: id, value: op.value, timestamp: op.timestamp, author: op.author },
                ChatOpKind::CreateChannel => {
                    WireOp::CreateChannel { key: id.to_string(), value: op.value, timestamp: op.timestamp, author: op.author }
                }
            },
            ChatOpKey::Channel(name) => {
                WireOp::CreateChannel { key: name, value: op.value, timestamp: op.timestamp, author: op.author }
            }
        }
    }
}

impl WireOp {
    /// Recovers the concrete `GridOp`, if this wire op is a `set-cell`.
    #[must_use]
    pub fn into_grid_op(self) -> Option<GridOp> {
        match self {
            WireOp::SetCell { key: (row, col), value, timestamp, author } => {
                Some(GridOp { row, col, cell: value, timestamp, author })
            }
            _ => None,
        }
    }

    /// Recovers the concrete `ChatOp`, if this wire op is a chat variant.
    #[must_use]
    pub fn into_chat_op(self) -> Option<ChatOp> {
        match self {
            WireOp::Send { key, value, timestamp, author } => {
                Some(ChatOp { kind: ChatOpKind::Send, key: ChatOpKey::Message(key), value, timestamp, author })
            }
            WireOp::Edit { key, value, timestamp, author } => {
                Some(ChatOp { kind: ChatOpKind::Edit, key: ChatOpKey::Message(key), value, timestamp, author })
            }
            WireOp::Delete { key, value, timestamp, author } => {
                Some(ChatOp { kind: ChatOpKind::Delete, key: ChatOpKey::Message(key), value, timestamp, author })
            }
            WireOp::CreateChannel { key, value, timestamp, author } => {
                Some(ChatOp { kind: ChatOpKind::CreateChannel, key: ChatOpKey::Channel(key), value, timestamp, author })
            }
            WireOp::SetCell { .. } => None,
        }
    }
}

/// The two payload shapes from spec §4.4. A replica may host a grid, a
/// chat log, or both (spec §1, "and/or"), so the state variant carries
/// an optional digest per document rather than picking one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SyncPayload {
    #[serde(rename = "ops")]
    Ops {
        since: Option<LamportTimestamp>,
        ops: Vec<WireOp>,
    },
    #[serde(rename = "state")]
    State {
        #[serde(default)]
        grid: Option<GridStateDigest>,
        #[serde(default)]
        chat: Option<ChatStateDigest>,
    },
}

/// Top-level wire message exchanged over a peer session (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WireMessage {
    #[serde(rename = "announcement")]
    Announcement(Announcement),

    #[serde(rename = "sync_request")]
    SyncRequest { since: Option<LamportTimestamp> },

    #[serde(rename = "sync_response")]
    SyncResponse { ok: bool, payload: Option<SyncPayload> },

    #[serde(rename = "push")]
    Push { payload: SyncPayload },

    #[serde(rename = "sync_ack")]
    Ack { ok: bool },
}
