use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use bridge_types::ConfigSnapshot;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Per-subscriber delivery deadline (§4.1): a slow subscriber drops the
/// update rather than blocking others.
const DELIVERY_TIMEOUT: Duration = Duration::from_millis(500);

/// Bound on the per-subscriber channel. Small: subscribers are expected to
/// drain promptly; a deep backlog is exactly the "slow subscriber" case
/// the delivery timeout protects against.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 8;

/// Handle returned by [`ConfigBroadcaster::subscribe`]; pass to
/// [`ConfigBroadcaster::unsubscribe`] to stop receiving further snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Inner {
    current: ConfigSnapshot,
    subscribers: HashMap<u64, mpsc::Sender<ConfigSnapshot>>,
    next_id: u64,
}

/// Holds one current [`ConfigSnapshot`] and fans out full merged snapshots
/// to subscribers (§4.1).
///
/// `Subscribe`, `Unsubscribe`, and `Publish` are all linearized behind one
/// `std::sync::Mutex` (§5 shared-state discipline) guarding both the
/// current snapshot and the subscriber map; none of the critical sections
/// below hold the lock across an `.await`, so a plain (non-async) mutex is
/// enough.
pub struct ConfigBroadcaster {
    inner: Mutex<Inner>,
}

impl ConfigBroadcaster {
    pub fn new(initial: ConfigSnapshot) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current: initial,
                subscribers: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    pub fn current(&self) -> ConfigSnapshot {
        self.inner.lock().unwrap().current.clone()
    }

    /// Registers a new subscriber and delivers it the current snapshot
    /// before returning, so a new subscriber can never miss the latest
    /// value (§4.1). The initial send happens with the lock still held, via
    /// `try_send` on the freshly-created (and therefore non-full) channel,
    /// so the insert into `subscribers` and the initial delivery are atomic
    /// with respect to a concurrent `publish`: a `publish` that observes
    /// this subscriber in the map can only do so after the initial snapshot
    /// has already been queued ahead of it. Doing this with an awaited
    /// `.send()` after releasing the lock would not have this property — a
    /// concurrent `publish` could acquire the lock, see the new subscriber,
    /// and have its spawned delivery task run before the unspawned initial
    /// send was even scheduled.
    pub async fn subscribe(&self) -> (SubscriptionId, mpsc::Receiver<ConfigSnapshot>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        let id = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;
            let snapshot = inner.current.clone();
            if tx.try_send(snapshot).is_err() {
                warn!(subscriber = id, "initial snapshot delivery failed");
            }
            inner.subscribers.insert(id, tx);
            id
        };
        (SubscriptionId(id), rx)
    }

    /// After this returns, no further snapshots are scheduled for
    /// delivery to `id`. A delivery already in flight from a `publish`
    /// call that started before this one is not guaranteed to be
    /// cancelled (§4.1: "racing deliveries from before the call are
    /// tolerated").
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.lock().unwrap().subscribers.remove(&id.0);
    }

    /// Merges `update` into the current snapshot (last-writer-wins per
    /// field) and fans the full merged snapshot out to every subscriber.
    /// Each delivery runs on its own task with its own deadline so one
    /// slow subscriber cannot delay delivery to, or the return of this
    /// call for, any other subscriber.
    pub async fn publish(&self, update: ConfigSnapshot) -> ConfigSnapshot {
        let (merged, targets) = {
            let mut inner = self.inner.lock().unwrap();
            inner.current.merge(&update);
            (inner.current.clone(), inner.subscribers.clone())
        };
        for (id, tx) in targets {
            let snapshot = merged.clone();
            tokio::spawn(async move {
                if tokio::time::timeout(DELIVERY_TIMEOUT, tx.send(snapshot)).await.is_err() {
                    debug!(subscriber = id, "dropped update: slow subscriber");
                }
            });
        }
        merged
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_subscriber_gets_current_snapshot_first() {
        let initial = ConfigSnapshot {
            bucket: Some("models".into()),
            ..Default::default()
        };
        let bc = ConfigBroadcaster::new(initial.clone());
        let (_id, mut rx) = bc.subscribe().await;
        let first = rx.recv().await.unwrap();
        assert_eq!(first, initial);
    }

    #[tokio::test]
    async fn publish_merges_and_fans_out() {
        let bc = ConfigBroadcaster::new(ConfigSnapshot::default());
        let (_id, mut rx) = bc.subscribe().await;
        let _ = rx.recv().await.unwrap(); // initial empty snapshot

        let merged = bc
            .publish(ConfigSnapshot {
                bucket: Some("models".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(merged.bucket.as_deref(), Some("models"));

        let delivered = rx.recv().await.unwrap();
        assert_eq!(delivered.bucket.as_deref(), Some("models"));
    }

    #[tokio::test]
    async fn last_writer_wins_across_publishes() {
        let bc = ConfigBroadcaster::new(ConfigSnapshot::default());
        bc.publish(ConfigSnapshot {
            bucket: Some("a".into()),
            endpoint: Some("x:1".into()),
            ..Default::default()
        })
        .await;
        let merged = bc
            .publish(ConfigSnapshot {
                bucket: Some("b".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(merged.bucket.as_deref(), Some("b"));
        assert_eq!(merged.endpoint.as_deref(), Some("x:1"));
    }

    /// §4.1: "the snapshot a subscriber receives on subscription precedes
    /// any subsequent snapshot it receives." Runs on a multi-threaded
    /// runtime (matching `bridge-node`'s `tokio::runtime::Runtime::new()`)
    /// and races `subscribe` against a concurrent `publish` many times so a
    /// regression to an unlocked initial send would show up as the merged
    /// snapshot arriving before, or instead of, the initial one.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_subscribe_and_publish_preserves_initial_ordering() {
        for _ in 0..200 {
            let bc = std::sync::Arc::new(ConfigBroadcaster::new(ConfigSnapshot {
                bucket: Some("initial".into()),
                ..Default::default()
            }));

            let bc_sub = bc.clone();
            let bc_pub = bc.clone();
            let (sub_result, _) = tokio::join!(
                tokio::spawn(async move { bc_sub.subscribe().await }),
                tokio::spawn(async move {
                    bc_pub
                        .publish(ConfigSnapshot {
                            bucket: Some("updated".into()),
                            ..Default::default()
                        })
                        .await;
                })
            );
            let (_id, mut rx) = sub_result.unwrap();

            let first = rx.recv().await.unwrap();
            assert_eq!(first.bucket.as_deref(), Some("initial"), "initial snapshot must always be observed first");

            // A racing publish's merged snapshot, if it arrives at all, must
            // arrive strictly after the initial one, never instead of it.
            if let Ok(Some(second)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
                assert_eq!(second.bucket.as_deref(), Some("updated"));
            }
        }
    }

    #[tokio::test]
    async fn unsubscribe_stops_future_deliveries() {
        let bc = ConfigBroadcaster::new(ConfigSnapshot::default());
        let (id, mut rx) = bc.subscribe().await;
        let _ = rx.recv().await.unwrap();
        bc.unsubscribe(id);
        assert_eq!(bc.subscriber_count(), 0);

        bc.publish(ConfigSnapshot {
            bucket: Some("after-unsub".into()),
            ..Default::default()
        })
        .await;

        // Give any (unexpected) in-flight delivery a chance to land, then
        // confirm nothing arrived.
        let got = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(got.is_err(), "unsubscribed receiver should not get further updates");
    }
}
