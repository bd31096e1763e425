//! Error types for the sync layer — the network/protocol-facing kinds of
//! the error taxonomy (spec §7). `InvalidArgument`/`PreconditionFailed`
//! belong to [`weave_crdt::CrdtError`] and are never raised here.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while exchanging or ingesting sync payloads.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Peer announced (or replied with) an incompatible protocol version.
    /// The peer stays in the discovery set but is excluded from sync.
    #[error("protocol version mismatch: expected {expected}, got {got}")]
    ProtocolVersion { expected: String, got: String },

    /// Payload failed to parse or parsed into a shape the engine can't
    /// use. The whole payload is rejected; the session stays open.
    #[error("malformed payload: {0}")]
    WireFormat(String),

    /// Transport-level failure (connect/read/write/send). Recovered by
    /// the caller on the next scheduled tick; never surfaced past the
    /// session boundary.
    #[error("transport error: {0}")]
    TransportTransient(String),

    /// Cannot bind a required listener socket at startup.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::WireFormat(err.to_string())
    }
}

/// An I/O failure reading/writing the framing itself (socket closed,
/// reset, etc.) is always `TransportTransient`, never `WireFormat` — a
/// malformed payload is a property of the bytes, not of the connection
/// that carried them.
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::TransportTransient(err.to_string())
    }
}
