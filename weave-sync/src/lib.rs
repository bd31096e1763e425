//! Wire protocol and ingestion engine for replicating `weave-crdt` state
//! between peers (spec §4.4/§6).
//!
//! This crate owns the wire *shapes* and the length-prefixed JSON framing
//! ([`framing`]) but no sockets of its own: `weave-net` owns peer session
//! connections, `weave-discovery` owns the announce/listen/sweep loops,
//! and both use [`framing::read_message`]/[`framing::write_message`] to
//! move [`protocol::WireMessage`] across a stream and hand the resulting
//! payloads to [`engine::SyncEngine`] to ingest.

mod engine;
mod error;
pub mod framing;
mod notify;
pub mod protocol;

pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use notify::ChangeNotifier;
pub use protocol::{Announcement, SyncPayload, WireMessage, WireOp, APP_TAG, PROTOCOL_VERSION};
