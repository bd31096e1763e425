//! Errors surfaced by peer sessions (spec §7).

use thiserror::Error;
use weave_sync::SyncError;

/// Errors raised while driving a [`crate::PeerSession`]. `Transport`
/// covers spec §7's `TransportTransient` (the session moves to
/// `Disconnected` and relies on the next discovery/schedule tick to
/// retry); `Protocol` covers `WireFormat`/`ProtocolVersion` (the session
/// stays open — a malformed or version-mismatched payload is dropped,
/// not a reason to tear down the connection).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not connected")]
    NotConnected,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("peer rejected the request")]
    Rejected,
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Transport(err.to_string())
    }
}

/// `WireFormat`/`ProtocolVersion` map to `Protocol` (session stays open);
/// everything else is a `Transport` failure (session disconnects).
impl From<SyncError> for SessionError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::WireFormat(msg) => SessionError::Protocol(msg),
            SyncError::ProtocolVersion { expected, got } => {
                SessionError::Protocol(format!("protocol version mismatch: expected {expected}, got {got}"))
            }
            SyncError::TransportTransient(msg) => SessionError::Transport(msg),
            SyncError::Fatal(msg) => SessionError::Transport(msg),
        }
    }
}
