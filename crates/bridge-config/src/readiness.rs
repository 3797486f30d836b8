use std::sync::Arc;
use std::time::Duration;

use bridge_types::ConfigSnapshot;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::broadcaster::ConfigBroadcaster;

/// 30-second refresh ticker (§4.2): re-evaluates readiness even when no
/// new snapshot has arrived, so externally-caused readiness changes (a
/// file appearing, a bucket becoming reachable) still unblock the gate.
const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Wraps [`ConfigBroadcaster::subscribe`] with a per-component readiness
/// predicate. A component calls [`ReadinessGate::wait_ready`] once at
/// startup; it blocks (cooperatively, via `select!`) until the predicate
/// accepts a snapshot, then hands back that snapshot plus a receiver for
/// every later one, for live reconfiguration.
pub struct ReadinessGate {
    broadcaster: Arc<ConfigBroadcaster>,
}

impl ReadinessGate {
    pub fn new(broadcaster: Arc<ConfigBroadcaster>) -> Self {
        Self { broadcaster }
    }

    /// Returns `None` only if `cancel` fires before the predicate ever
    /// accepts a snapshot; the gate never returns to a "not ready" state
    /// once it has returned `Some` (§ state machine: waiting -> ready,
    /// never back to waiting).
    pub async fn wait_ready<F>(&self, predicate: F, cancel: &CancellationToken) -> Option<(ConfigSnapshot, mpsc::Receiver<ConfigSnapshot>)>
    where
        F: Fn(&ConfigSnapshot) -> bool,
    {
        let (sub, mut rx) = self.broadcaster.subscribe().await;
        let mut last = self.broadcaster.current();
        let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
        ticker.tick().await; // interval's first tick fires immediately; consume it

        loop {
            if predicate(&last) {
                return Some((last, rx));
            }
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.broadcaster.unsubscribe(sub);
                    return None;
                }
                maybe_snapshot = rx.recv() => {
                    match maybe_snapshot {
                        Some(snapshot) => last = snapshot,
                        None => return None,
                    }
                }
                _ = ticker.tick() => {
                    // Loop back around and re-run the predicate against
                    // `last` in case external state (not a new snapshot)
                    // now satisfies it.
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_types::Endpoint;

    #[tokio::test]
    async fn waits_until_predicate_accepts_a_snapshot() {
        let broadcaster = Arc::new(ConfigBroadcaster::new(ConfigSnapshot::default()));
        let gate = ReadinessGate::new(broadcaster.clone());

        let wait_task = tokio::spawn({
            let cancel = CancellationToken::new();
            let gate = gate;
            async move {
                gate.wait_ready(
                    |snap| snap.endpoint.as_deref().map(Endpoint::is_parseable).unwrap_or(false),
                    &cancel,
                )
                .await
            }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        broadcaster
            .publish(ConfigSnapshot {
                endpoint: Some("store.local:9000".into()),
                ..Default::default()
            })
            .await;

        let result = wait_task.await.unwrap();
        let (snapshot, _rx) = result.expect("gate should have become ready");
        assert_eq!(snapshot.endpoint.as_deref(), Some("store.local:9000"));
    }

    #[tokio::test]
    async fn cancellation_unblocks_a_gate_that_never_becomes_ready() {
        let broadcaster = Arc::new(ConfigBroadcaster::new(ConfigSnapshot::default()));
        let gate = ReadinessGate::new(broadcaster);
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        let wait_task = tokio::spawn(async move { gate.wait_ready(|_| false, &cancel_clone).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let result = wait_task.await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn already_ready_snapshot_returns_immediately() {
        let broadcaster = Arc::new(ConfigBroadcaster::new(ConfigSnapshot {
            bucket: Some("models".into()),
            ..Default::default()
        }));
        let gate = ReadinessGate::new(broadcaster);
        let cancel = CancellationToken::new();

        let result = tokio::time::timeout(Duration::from_millis(100), gate.wait_ready(|snap| snap.bucket.is_some(), &cancel))
            .await
            .expect("should not need to wait");
        assert!(result.is_some());
    }
}
