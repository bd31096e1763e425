//! Per-peer TCP session: the state machine and request/response primitives
//! from spec §4.6. Grounded on `privstack-sync::p2p::connection::P2pConnection`
//! for the "lightweight handle" framing, generalized from a libp2p peer
//! handle to a concrete TCP connection owned exclusively by its own task
//! (spec §5: "per-session socket... never touched by other threads").

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use weave_sync::{framing, SyncError, SyncPayload, WireMessage};
use weave_types::ReplicaId;

use crate::error::SessionError;

/// The session state machine from spec §4.6:
/// `Disconnected -> Connecting -> Established -> Syncing -> Established`,
/// collapsing to `Disconnected` from any state on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Established,
    Syncing,
}

/// A TCP session to one peer. Owns its socket; nothing outside the task
/// driving this session touches it directly (see [`crate::registry`] for
/// the handle other components hold instead).
pub struct PeerSession {
    replica_id: ReplicaId,
    addr: SocketAddr,
    state: SessionState,
    stream: Option<TcpStream>,
}

impl PeerSession {
    #[must_use]
    pub fn new(replica_id: ReplicaId, addr: SocketAddr) -> Self {
        Self {
            replica_id,
            addr,
            state: SessionState::Disconnected,
            stream: None,
        }
    }

    #[must_use]
    pub fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_established(&self) -> bool {
        matches!(self.state, SessionState::Established | SessionState::Syncing)
    }

    /// `Disconnected -> Connecting -> Established` on a successful TCP
    /// connect within `connect_timeout`, or back to `Disconnected` on
    /// failure (spec §4.6).
    pub async fn connect(&mut self, connect_timeout: Duration) -> Result<(), SessionError> {
        self.state = SessionState::Connecting;
        match timeout(connect_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(stream)) => {
                self.stream = Some(stream);
                self.state = SessionState::Established;
                Ok(())
            }
            Ok(Err(e)) => {
                self.disconnect();
                Err(SessionError::Transport(e.to_string()))
            }
            Err(_) => {
                self.disconnect();
                Err(SessionError::Transport(format!(
                    "connect to {} timed out after {connect_timeout:?}",
                    self.addr
                )))
            }
        }
    }

    /// Sends `sync_request { since }` and returns the payload from
    /// `sync_response`. Moves `Established -> Syncing -> Established`.
    pub async fn sync_request(&mut self, since: Option<weave_types::LamportTimestamp>) -> Result<SyncPayload, SessionError> {
        match self.request(WireMessage::SyncRequest { since }).await? {
            WireMessage::SyncResponse { ok: true, payload: Some(payload) } => Ok(payload),
            WireMessage::SyncResponse { ok: false, .. } => Err(SessionError::Rejected),
            other => Err(SessionError::Protocol(format!("unexpected reply to sync_request: {other:?}"))),
        }
    }

    /// Sends `push { payload }` and awaits `ack`. Used for local-edit
    /// fan-out (spec §4.6).
    pub async fn push(&mut self, payload: SyncPayload) -> Result<(), SessionError> {
        match self.request(WireMessage::Push { payload }).await? {
            WireMessage::Ack { ok: true } => Ok(()),
            WireMessage::Ack { ok: false } => Err(SessionError::Rejected),
            other => Err(SessionError::Protocol(format!("unexpected reply to push: {other:?}"))),
        }
    }

    /// The single in-flight request primitive: write one message, read
    /// one reply. A transport failure disconnects the session — the
    /// caller never sees a half-open connection (spec §5 "any ->
    /// Disconnected on read/write/timeout error"). A malformed reply
    /// (spec §7 `WireFormat`) is dropped without tearing the session
    /// down: the peer is still there, only this one reply was bad.
    async fn request(&mut self, message: WireMessage) -> Result<WireMessage, SessionError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(SessionError::NotConnected);
        };
        self.state = SessionState::Syncing;

        if let Err(e) = framing::write_message(stream, &message).await {
            self.disconnect();
            return Err(e.into());
        }

        match framing::read_message::<WireMessage, _>(stream).await {
            Ok(response) => {
                self.state = SessionState::Established;
                Ok(response)
            }
            Err(SyncError::WireFormat(reason)) => {
                self.state = SessionState::Established;
                Err(SessionError::Protocol(reason))
            }
            Err(e) => {
                self.disconnect();
                Err(e.into())
            }
        }
    }

    /// Any error path and explicit peer-lost notifications land here:
    /// drop the socket, fall back to `Disconnected` (spec §4.6).
    pub fn disconnect(&mut self) {
        self.stream = None;
        self.state = SessionState::Disconnected;
    }
}
