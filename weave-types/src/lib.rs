//! Identifiers and logical-time primitives shared by every replication
//! crate in the workspace. No networking, no CRDT state — just the
//! vocabulary the other crates build on.

mod ids;
mod lamport;
mod ports;

pub use ids::{MessageId, ReplicaId};
pub use lamport::{LamportClock, LamportTimestamp};
pub use ports::{discovery_port, ident_port, DEFAULT_BASE_PORT, DISCOVERY_PORT_OFFSET, IDENT_PORT_OFFSET};
