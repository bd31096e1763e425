//! Change notification hook (spec §6): "a 'changed' notification hook
//! with no arguments fires after every accepted remote or local
//! mutation." Spec §9 prescribes the shape directly — "a subscription
//! list on the replica owning the state; deliver notifications
//! synchronously on the mutation path" — so this is a thin wrapper over
//! a broadcast channel of `()`, the same subscription-list idiom
//! `weave_discovery::Peers` already uses for discovered/lost events.

use tokio::sync::broadcast;

/// A cheap, cloneable handle to one replica's change-notification list.
/// `notify()` is called once per accepted mutation, synchronously on the
/// mutation path; `subscribe()` hands out an independent receiver per
/// observer, so a slow subscriber only drops its own backlog of signals
/// (tokio broadcast semantics) and never blocks the mutation path.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<()>,
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Signals every current subscriber that a mutation was accepted.
    /// No-op if nobody is listening.
    pub fn notify(&self) {
        let _ = self.tx.send(());
    }

    /// Subscribes to future change notifications. Each call returns an
    /// independent FIFO-ordered receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_subscriber_observes_a_notification() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe();
        notifier.notify();
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn multiple_subscribers_each_observe_the_same_notification() {
        let notifier = ChangeNotifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        notifier.notify();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[tokio::test]
    async fn notifying_with_no_subscribers_does_not_panic() {
        let notifier = ChangeNotifier::new();
        notifier.notify();
    }
}
