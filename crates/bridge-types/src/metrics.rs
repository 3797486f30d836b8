use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

/// Metrics objects shared by the Scanner, TFX Reconciler, and Queue
/// Matcher. Created once against the process's `prometheus::Registry` and
/// cloned (cheaply — every field here is an `Arc` internally) into each
/// component constructor, rather than reached for through a global.
///
/// The scrape HTTP endpoint that exposes `registry` is an excluded
/// collaborator (§6); this struct only owns the metric objects themselves.
#[derive(Clone)]
pub struct BridgeMetrics {
    pub scan_passes_total: IntCounter,
    pub scan_duration_seconds: Histogram,
    pub scan_errors_total: IntCounterVec,
    pub tfx_passes_total: IntCounter,
    pub tfx_duration_seconds: Histogram,
    pub tfx_additions_total: IntCounter,
    pub tfx_deletions_total: IntCounter,
    pub queue_assignments_total: IntCounter,
    pub catalog_models: IntGauge,
}

impl BridgeMetrics {
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let scan_passes_total = IntCounter::new("bridge_scan_passes_total", "Total bucket scan passes completed")?;
        registry.register(Box::new(scan_passes_total.clone()))?;

        let scan_duration_seconds = Histogram::with_opts(HistogramOpts::new("bridge_scan_duration_seconds", "Bucket scan pass duration, in seconds"))?;
        registry.register(Box::new(scan_duration_seconds.clone()))?;

        let scan_errors_total = IntCounterVec::new(Opts::new("bridge_scan_errors_total", "Bucket scan errors, labeled by error kind"), &["kind"])?;
        registry.register(Box::new(scan_errors_total.clone()))?;

        let tfx_passes_total = IntCounter::new("bridge_tfx_passes_total", "Total TFX reconcile passes completed")?;
        registry.register(Box::new(tfx_passes_total.clone()))?;

        let tfx_duration_seconds = Histogram::with_opts(HistogramOpts::new("bridge_tfx_duration_seconds", "TFX reconcile pass duration, in seconds"))?;
        registry.register(Box::new(tfx_duration_seconds.clone()))?;

        let tfx_additions_total = IntCounter::new("bridge_tfx_additions_total", "Served-model entries added across all reconcile passes")?;
        registry.register(Box::new(tfx_additions_total.clone()))?;

        let tfx_deletions_total = IntCounter::new("bridge_tfx_deletions_total", "Served-model entries removed across all reconcile passes")?;
        registry.register(Box::new(tfx_deletions_total.clone()))?;

        let queue_assignments_total = IntCounter::new("bridge_queue_assignments_total", "Queue-to-node-group assignments made")?;
        registry.register(Box::new(queue_assignments_total.clone()))?;

        let catalog_models = IntGauge::new("bridge_catalog_models", "Models currently held in the catalog, across all endpoints")?;
        registry.register(Box::new(catalog_models.clone()))?;

        Ok(Self {
            scan_passes_total,
            scan_duration_seconds,
            scan_errors_total,
            tfx_passes_total,
            tfx_duration_seconds,
            tfx_additions_total,
            tfx_deletions_total,
            queue_assignments_total,
            catalog_models,
        })
    }
}
