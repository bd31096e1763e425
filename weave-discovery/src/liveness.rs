//! Liveness reaper (spec §4.5): periodically evicts peers that have gone
//! quiet, grounded on `descubrimiento_nodos.py::_limpiar_nodos_inactivos`.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::info;

use crate::peer::Peers;

/// Runs the reaper loop until `shutdown` fires: every `period`, removes
/// any peer whose `last_seen` exceeds `timeout`, firing a `Lost` event
/// for each (delivered through [`Peers::subscribe`]).
pub async fn run_liveness_reaper(peers: Peers, period: Duration, timeout: Duration, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = sleep(period) => {}
            _ = shutdown.changed() => return,
        }

        let lost = peers.reap_expired(timeout).await;
        for peer in lost {
            info!(replica_id = %peer.replica_id, display_name = %peer.display_name, "peer lost");
        }
    }
}
