use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bridge_catalog::Catalog;
use bridge_config::{CycleSignals, ReadinessGate};
use bridge_types::{BridgeError, BridgeMetrics, ConfigSink, ConfigSnapshot, ErrorSuppressor};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::document::{ServedModelEntry, ServingConfigDocument};
use crate::sink::{ConfigMapSink, FileSink, ServingConfigSink};

/// Default reconcile-pass ticker (§4.6: "on a configurable ticker (default
/// ≈ 1 minute)").
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// The bridge always emits `s3://` blob URIs (§6, and §9 Open Question
/// (iii): other schemes are undecided, so none are emitted).
const BLOB_SCHEME: &str = "s3";

fn tfx_ready(snapshot: &ConfigSnapshot) -> bool {
    snapshot.bucket.is_some() && matches!(snapshot.sink(), Ok(ConfigSink::File(_)) | Ok(ConfigSink::ConfigMap(_)))
}

fn synth_uri(bucket: &str, base_dir: &str) -> String {
    format!("{BLOB_SCHEME}://{bucket}/{base_dir}/")
}

/// Builds the active [`ServingConfigSink`] from the current snapshot.
/// Separate from [`ServingConfigSink`] itself so tests can substitute a
/// factory that hands back an in-memory sink without touching a real file
/// or config map.
pub trait SinkFactory: Send + Sync {
    fn build(&self, snapshot: &ConfigSnapshot) -> Result<Box<dyn ServingConfigSink>, BridgeError>;
}

/// Resolves [`ConfigSnapshot::sink`] into a real [`FileSink`] or
/// [`ConfigMapSink`]. The config-map backend's actual Kubernetes calls are
/// supplied by the caller, since they're an excluded collaborator (§1).
pub struct DefaultSinkFactory {
    pub config_map_backend: Arc<dyn crate::sink::ConfigMapBackend>,
}

impl SinkFactory for DefaultSinkFactory {
    fn build(&self, snapshot: &ConfigSnapshot) -> Result<Box<dyn ServingConfigSink>, BridgeError> {
        match snapshot.sink()? {
            ConfigSink::File(path) => Ok(Box::new(FileSink::new(path))),
            ConfigSink::ConfigMap(name) => Ok(Box::new(ConfigMapSink::new(name, self.config_map_backend.clone()))),
            ConfigSink::Unconfigured => Err(BridgeError::configuration("no serving-config sink configured")),
        }
    }
}

/// Outcome of one reconcile pass: whether the sink was written, and how
/// many entries were added/removed, for the `bridge_tfx_*` counters.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub wrote: bool,
    pub additions: usize,
    pub deletions: usize,
}

/// One reconcile pass (§4.6 steps 2-7): leaves the sink untouched if there
/// is nothing to change.
pub async fn reconcile_pass(sink: &dyn ServingConfigSink, catalog: &Catalog, bucket: &str) -> Result<ReconcileOutcome, BridgeError> {
    let content = sink.read().await?;
    let mut doc = ServingConfigDocument::parse(&content)?;

    let desired_bases = catalog.get_bases();
    let present_paths: HashSet<String> = doc.entries.iter().map(|e| e.base_path.clone()).collect();
    let desired_paths: HashSet<String> = desired_bases.iter().map(|base| synth_uri(bucket, base)).collect();

    let deletions: HashSet<String> = present_paths.difference(&desired_paths).cloned().collect();
    let additions: Vec<&String> = desired_bases.iter().filter(|base| !present_paths.contains(&synth_uri(bucket, base))).collect();

    if deletions.is_empty() && additions.is_empty() {
        return Ok(ReconcileOutcome::default());
    }

    let (num_deletions, num_additions) = (deletions.len(), additions.len());
    doc.entries.retain(|entry| !deletions.contains(&entry.base_path));
    for base_dir in additions {
        doc.entries.push(ServedModelEntry::new(base_dir.clone(), synth_uri(bucket, base_dir)));
    }

    sink.write(&doc.serialize()).await?;
    Ok(ReconcileOutcome { wrote: true, additions: num_additions, deletions: num_deletions })
}

/// Runs reconcile passes until `cancel` fires (§4.6, §5: one task per
/// component).
pub struct TfxReconciler {
    pub catalog: Arc<Catalog>,
    pub readiness: Arc<ReadinessGate>,
    pub sink_factory: Arc<dyn SinkFactory>,
    pub signals: CycleSignals,
    pub tick_interval: Duration,
    pub metrics: Arc<BridgeMetrics>,
    pub error_suppressor: Arc<ErrorSuppressor>,
}

impl TfxReconciler {
    pub async fn run(self, cancel: CancellationToken) {
        let Some((mut snapshot, mut config_rx)) = self.readiness.wait_ready(tfx_ready, &cancel).await else {
            return;
        };

        let mut last_sink_id = String::new();
        let mut ticker = tokio::time::interval(self.tick_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                maybe_update = config_rx.recv() => {
                    match maybe_update {
                        Some(update) => snapshot = update,
                        None => return,
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let sink = match self.sink_factory.build(&snapshot) {
                Ok(sink) => sink,
                Err(e) => {
                    warn!(error = %e, "tfx reconciler could not resolve its sink this pass");
                    continue;
                }
            };
            if sink.id() != last_sink_id {
                if !last_sink_id.is_empty() {
                    info!(old = %last_sink_id, new = %sink.id(), "serving-config sink changed");
                }
                last_sink_id = sink.id().to_string();
            }

            let Some(bucket) = snapshot.bucket.clone() else {
                continue;
            };

            self.signals.started.fire();
            let started_at = std::time::Instant::now();
            let result = reconcile_pass(sink.as_ref(), &self.catalog, &bucket).await;
            self.metrics.tfx_duration_seconds.observe(started_at.elapsed().as_secs_f64());
            self.metrics.tfx_passes_total.inc();
            self.signals.ended.fire();

            match result {
                Ok(outcome) => {
                    self.metrics.tfx_additions_total.inc_by(outcome.additions as u64);
                    self.metrics.tfx_deletions_total.inc_by(outcome.deletions as u64);
                }
                Err(e) => {
                    if self.error_suppressor.should_emit(&e.to_string()) {
                        warn!(error = %e, "tfx reconcile pass failed");
                    }
                }
            }
        }
    }
}
