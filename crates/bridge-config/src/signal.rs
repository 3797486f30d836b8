use std::sync::Arc;

use tokio::sync::watch;

/// Test-facing "cycle" signal pair (`scan-started`/`scan-ended`,
/// `tfx-started`/`tfx-ended`, §4.3/§4.6).
///
/// The design note calls for "close, then replace" semantics so multiple
/// observers can rendezvous on each cycle. We encode that with a `watch`
/// generation counter rather than literally closing and reopening a
/// channel: each [`CycleSignal::fire`] bumps the generation, and every
/// outstanding [`CycleWaiter::wait_next`] wakes exactly once per bump, the
/// same rendezvous a close-then-replace protocol gives testers, expressed
/// with the primitive `tokio::sync::watch` already provides for it.
#[derive(Clone)]
pub struct CycleSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl CycleSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn waiter(&self) -> CycleWaiter {
        CycleWaiter(self.tx.subscribe())
    }

    /// Marks one occurrence of the event (a pass starting, or ending).
    pub fn fire(&self) {
        self.tx.send_modify(|generation| *generation = generation.wrapping_add(1));
    }
}

impl Default for CycleSignal {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CycleWaiter(watch::Receiver<u64>);

impl CycleWaiter {
    /// Waits for the next `fire()` after this waiter was created (or after
    /// the last call to `wait_next`). Returns `false` if the signal was
    /// dropped (process shutting down) rather than fired.
    pub async fn wait_next(&mut self) -> bool {
        self.0.changed().await.is_ok()
    }
}

/// A start/end pair for one kind of pass, replaced as a unit so "wait on
/// both, in order" (§4.3) is just waiting on `started` then `ended`.
#[derive(Clone)]
pub struct CycleSignals {
    pub started: CycleSignal,
    pub ended: CycleSignal,
}

impl CycleSignals {
    pub fn new() -> Self {
        Self {
            started: CycleSignal::new(),
            ended: CycleSignal::new(),
        }
    }
}

impl Default for CycleSignals {
    fn default() -> Self {
        Self::new()
    }
}
