use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use bridge_catalog::Catalog;
use bridge_config::{CycleSignals, ReadinessGate};
use bridge_store::ObjectStoreClient;
use bridge_types::{BridgeError, BridgeMetrics, ConfigSnapshot, Endpoint, ErrorKind, ErrorSuppressor};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::factory::ClientFactory;
use crate::pass::scan_pass;

const INITIAL_BACKOFF: Duration = Duration::from_secs(3);
const BACKOFF_MULTIPLIER: f64 = 1.5;
const MAX_ELAPSED_BACKOFF: Duration = Duration::from_secs(15);

/// Bound on consecutive credential-rebuild retries within one pass attempt
/// before falling back to the normal backoff schedule (§ Failure semantics:
/// "a bounded retry count (≈ 6)").
const AUTH_RETRY_BOUND: u32 = 6;

/// Default idle period between successful scan passes (the `s3-refresh`
/// CLI flag's default).
pub const DEFAULT_SUCCESS_INTERVAL: Duration = Duration::from_secs(30);

fn endpoint_ready(snapshot: &ConfigSnapshot) -> bool {
    snapshot.endpoint.as_deref().map(Endpoint::is_parseable).unwrap_or(false)
}

fn new_backoff() -> backoff::ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(INITIAL_BACKOFF)
        .with_multiplier(BACKOFF_MULTIPLIER)
        .with_max_elapsed_time(Some(MAX_ELAPSED_BACKOFF))
        .build()
}

/// Everything one running Scanner needs (§4.3, §5: one task per
/// component).
pub struct Scanner {
    pub catalog: Arc<Catalog>,
    pub readiness: Arc<ReadinessGate>,
    pub client_factory: Arc<dyn ClientFactory>,
    pub signals: CycleSignals,
    pub metrics: Arc<BridgeMetrics>,
    pub error_suppressor: Arc<ErrorSuppressor>,
    /// Idle period between a successful pass and the next one (the `s3-refresh`
    /// CLI flag); failures use the backoff schedule instead.
    pub success_interval: Duration,
}

impl Scanner {
    /// Runs scan passes until `cancel` fires, or returns early with a
    /// fatal error if startup fails before readiness is reached (the
    /// process entry point decides whether that's worth a non-zero exit
    /// code). Once the loop is running, pass failures are retried via
    /// backoff rather than propagated.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), BridgeError> {
        let Some((mut snapshot, mut config_rx)) = self.readiness.wait_ready(endpoint_ready, &cancel).await else {
            return Ok(());
        };

        let mut endpoint: Endpoint = match snapshot.endpoint().expect("readiness predicate guarantees Some") {
            Ok(e) => e,
            Err(e) => {
                error!(error = %e, "endpoint became unparseable after readiness accepted it");
                return Err(e);
            }
        };

        let mut client = match self.client_factory.build(&snapshot) {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "scanner could not build an initial client");
                return Err(e);
            }
        };

        let mut backoff = new_backoff();

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            while let Ok(update) = config_rx.try_recv() {
                snapshot = update;
            }
            if let Ok(new_endpoint) = snapshot.endpoint().unwrap_or_else(|| Ok(endpoint.clone())) {
                if new_endpoint != endpoint {
                    endpoint = new_endpoint;
                }
            }

            self.signals.started.fire();
            let started_at = std::time::Instant::now();
            let result = self.run_pass_with_credential_retry(&mut client, &snapshot, &endpoint).await;
            self.metrics.scan_duration_seconds.observe(started_at.elapsed().as_secs_f64());
            self.metrics.scan_passes_total.inc();
            self.metrics.catalog_models.set(self.catalog.model_count() as i64);
            self.signals.ended.fire();

            match result {
                Ok(()) => {
                    backoff.reset();
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(self.success_interval) => {}
                    }
                }
                Err(e) => {
                    self.metrics.scan_errors_total.with_label_values(&[&e.kind().to_string()]).inc();
                    if self.error_suppressor.should_emit(&e.to_string()) {
                        warn!(endpoint = %endpoint, error = %e, "scan pass failed");
                    }
                    match backoff.next_backoff() {
                        Some(delay) => {
                            tokio::select! {
                                _ = cancel.cancelled() => return Ok(()),
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                        None => {
                            // Max elapsed backoff reached; reset and keep trying rather
                            // than give up on an otherwise-live process.
                            backoff.reset();
                        }
                    }
                }
            }
        }
    }

    /// Runs one scan pass, rebuilding the client and retrying in place (no
    /// backoff sleep) up to [`AUTH_RETRY_BOUND`] times if the failure looks
    /// like credential rotation (§7 Auth: "AccessDenied after prior
    /// success"). A failed list never reaches the groom step, so no
    /// spurious groom happens while credentials are being sorted out.
    async fn run_pass_with_credential_retry(&self, client: &mut Box<dyn ObjectStoreClient>, snapshot: &ConfigSnapshot, endpoint: &Endpoint) -> Result<(), BridgeError> {
        let mut attempts = 0;
        loop {
            match scan_pass(client.as_ref(), &self.catalog, endpoint).await {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Auth && attempts < AUTH_RETRY_BOUND => {
                    attempts += 1;
                    info!(attempt = attempts, "credential rotation detected; rebuilding client");
                    match self.client_factory.build(snapshot) {
                        Ok(new_client) => *client = new_client,
                        Err(build_err) => return Err(build_err),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_config::ConfigBroadcaster;
    use bridge_store::StoreClient;
    use bytes::Bytes;
    use object_store::memory::InMemory;
    use object_store::path::Path as StorePath;
    use object_store::ObjectStore;
    use object_store::PutPayload;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// A factory whose very first built client fails its first `list_recursive`
    /// call with an Auth error, simulating credentials that were stale at
    /// process start; every client built after that (i.e. after the
    /// scanner's credential-rotation rebuild) behaves normally.
    struct FlakyFactory {
        store: Arc<InMemory>,
        build_count: AtomicU32,
    }

    struct FlakyClient {
        inner: StoreClient,
        fail_first_call: bool,
        called: AtomicU32,
    }

    #[async_trait::async_trait]
    impl ObjectStoreClient for FlakyClient {
        async fn list_recursive(&self, prefix: &str) -> Result<Vec<bridge_types::ObjectMeta>, BridgeError> {
            let call = self.called.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_first_call && call == 1 {
                return Err(BridgeError::auth("access denied (simulated)"));
            }
            self.inner.list_recursive(prefix).await
        }

        async fn get(&self, key: &str) -> Result<Bytes, BridgeError> {
            self.inner.get(key).await
        }

        async fn stat(&self, key: &str) -> Result<bridge_types::ObjectMeta, BridgeError> {
            self.inner.stat(key).await
        }
    }

    impl ClientFactory for FlakyFactory {
        fn build(&self, _snapshot: &ConfigSnapshot) -> Result<Box<dyn ObjectStoreClient>, BridgeError> {
            let build_number = self.build_count.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Box::new(FlakyClient {
                inner: StoreClient::new(self.store.clone()),
                fail_first_call: build_number == 1,
                called: AtomicU32::new(0),
            }))
        }
    }

    #[tokio::test]
    async fn recovers_from_access_denied_within_retry_bound() {
        let store = Arc::new(InMemory::new());
        store
            .put(&StorePath::from("index-X.csv"), PutPayload::from(Bytes::from_static(b"baseA,baseA/1,etag-1\n")))
            .await
            .unwrap();
        store.put(&StorePath::from("baseA/1"), PutPayload::from(Bytes::from_static(b"a"))).await.unwrap();

        // Every freshly-built client fails its first call, simulating a
        // credential that only becomes valid after the scanner rebuilds
        // its client in response to the Auth error.
        let factory = Arc::new(FlakyFactory {
            store,
            build_count: AtomicU32::new(0),
        });

        let catalog = Arc::new(Catalog::new());
        let broadcaster = Arc::new(ConfigBroadcaster::new(ConfigSnapshot {
            endpoint: Some("store.local:9000".into()),
            bucket: Some("models".into()),
            access_key: Some("ak".into()),
            secret_key: Some("sk".into()),
            ..Default::default()
        }));
        let readiness = Arc::new(ReadinessGate::new(broadcaster));
        let registry = prometheus::Registry::new();
        let scanner = Scanner {
            catalog: catalog.clone(),
            readiness,
            client_factory: factory,
            signals: CycleSignals::new(),
            metrics: Arc::new(BridgeMetrics::register(&registry).unwrap()),
            error_suppressor: Arc::new(ErrorSuppressor::new()),
            success_interval: Duration::from_secs(30),
        };

        let cancel = CancellationToken::new();
        let mut started = scanner.signals.started.waiter();
        let mut ended = scanner.signals.ended.waiter();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(scanner.run(cancel_clone));

        assert!(started.wait_next().await);
        assert!(ended.wait_next().await);
        cancel.cancel();
        handle.await.unwrap().unwrap();

        let endpoint = Endpoint::new("store.local", 9000);
        assert!(catalog.get(&endpoint, "index-X.csv").is_some());
    }
}
