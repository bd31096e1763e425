//! The accept side of a peer session (spec §4.6): listens on this
//! replica's service port and answers `sync_request`/`push` from
//! whichever peer dials in. Grounded on
//! `descubrimiento_nodos.py`'s `_manejar_conexion_cliente` accept/reply/
//! close shape, generalized from the identification-only exchange there
//! to the full `SyncEngine` request/response pair.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, warn};
use weave_sync::{framing, ChangeNotifier, SyncEngine, SyncError, SyncPayload, WireMessage};

use crate::driver::SharedCrdtState;

/// Binds `addr` and serves incoming peer sessions until `shutdown`
/// fires. Each accepted connection is handled on its own task so one
/// slow or stalled peer never blocks another. `notifier` fires (spec §6)
/// after any pushed payload is actually accepted into the shared state.
pub async fn run_session_server(
    addr: SocketAddr,
    shared_state: SharedCrdtState,
    engine: SyncEngine,
    notifier: ChangeNotifier,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer_addr) = accepted?;
                let shared_state = shared_state.clone();
                let notifier = notifier.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, shared_state, engine, notifier, shutdown).await {
                        debug!(%peer_addr, "session connection ended: {e}");
                    }
                });
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Serves requests on one already-accepted stream until the peer closes
/// it, it sends something unrecognized, or shutdown fires.
async fn handle_connection(
    mut stream: TcpStream,
    shared_state: SharedCrdtState,
    engine: SyncEngine,
    notifier: ChangeNotifier,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    loop {
        let request = tokio::select! {
            r = framing::read_message::<WireMessage, _>(&mut stream) => match r {
                Ok(request) => request,
                Err(SyncError::WireFormat(reason)) => {
                    warn!("dropping malformed payload from peer, session stays open: {reason}");
                    let rejection = WireMessage::Ack { ok: false };
                    framing::write_message(&mut stream, &rejection)
                        .await
                        .map_err(|e| std::io::Error::other(e.to_string()))?;
                    continue;
                }
                Err(e) => return Err(std::io::Error::other(e.to_string())),
            },
            _ = shutdown.changed() => return Ok(()),
        };

        let response = match request {
            WireMessage::SyncRequest { since } => {
                let guard = shared_state.lock().await;
                let (grid, chat) = &*guard;
                let payload = engine.make_delta_payload(grid, chat, since);
                WireMessage::SyncResponse { ok: true, payload: Some(payload) }
            }
            WireMessage::Push { payload } => {
                let mut guard = shared_state.lock().await;
                let (grid, chat) = &mut *guard;
                let accepted = engine.ingest_payload(grid, chat, &payload);
                if accepted {
                    debug!("accepted pushed changes from peer");
                    notifier.notify();
                }
                WireMessage::Ack { ok: true }
            }
            WireMessage::Announcement(_) => {
                // Identification handshake; nothing further to do on this path
                // (the discovery sweep server answers this on its own port).
                WireMessage::Ack { ok: true }
            }
            other => {
                warn!("unexpected message on a peer session: {other:?}");
                WireMessage::Ack { ok: false }
            }
        };

        framing::write_message(&mut stream, &response)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
    }
}
